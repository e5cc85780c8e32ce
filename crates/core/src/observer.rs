/// Receives driver events and decides how an iterative search proceeds.
///
/// Observers let callers monitor or steer a search without changing its API,
/// e.g. to trace bisection brackets or abandon an event search early.
///
/// `observe` returns `Option<A>`: `Some(action)` requests a driver-specific
/// action and `None` lets the driver continue unchanged.
///
/// Closures implement `Observer`, and `()` is the no-op observer.
pub trait Observer<E, A> {
    /// Observes an event and optionally returns a control action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
