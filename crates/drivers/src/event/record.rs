/// What triggered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// An event indicator changed sign.
    State,

    /// A time scheduled in advance by the unit was reached.
    Time,
}

/// A located event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventRecord {
    pub time: f64,
    pub kind: EventKind,

    /// Set once the unit's event iteration has run at `time`.
    pub consumed: bool,
}

impl EventRecord {
    #[must_use]
    pub fn new(time: f64, kind: EventKind) -> Self {
        Self {
            time,
            kind,
            consumed: false,
        }
    }

    /// Returns this record marked as handled.
    #[must_use]
    pub fn consumed(self) -> Self {
        Self {
            consumed: true,
            ..self
        }
    }
}
