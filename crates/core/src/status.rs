use std::fmt;

/// Ordinal outcome of a call into a simulation unit or driver.
///
/// Variants are ordered by severity, so the worse of two statuses is their
/// maximum. `Pending` marks an asynchronous call that has not completed yet
/// and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    #[default]
    Ok,
    Warning,
    Discard,
    Error,
    Fatal,
    Pending,
}

impl Status {
    /// Returns true for `Ok` and `Warning`.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Warning)
    }

    /// Returns the more severe of two statuses.
    #[must_use]
    pub fn worst(self, other: Status) -> Status {
        self.max(other)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Discard => "discard",
            Status::Error => "error",
            Status::Fatal => "fatal",
            Status::Pending => "pending",
        };
        f.write_str(name)
    }
}
