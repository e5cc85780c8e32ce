use super::Bracket;

/// Emitted after each bisection trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Trial count, starting at 1.
    pub iter: usize,

    /// Midpoint that was integrated to.
    pub time: f64,

    /// Whether the indicator signs at `time` differ from the left end.
    pub crossed: bool,

    /// Bracket after the trial.
    pub bracket: Bracket,
}
