use super::Bracket;

/// Indicates how an event search finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The bracket is narrower than the configured precision.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of an event search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final search status.
    pub status: Status,

    /// Located event time, the right end of `bracket`.
    pub time: f64,

    /// Final bracket.
    pub bracket: Bracket,

    /// Number of bisection trials.
    pub iters: usize,
}
