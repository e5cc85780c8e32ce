/// Actions an observer can take during an event search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the search and report the current bracket.
    StopEarly,
}
