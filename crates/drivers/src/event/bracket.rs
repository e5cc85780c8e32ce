use thiserror::Error;

/// Sign of an event indicator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Positive,
}

impl Sign {
    /// Zero counts as positive.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

pub(super) fn signs(indicators: &[f64]) -> Vec<Sign> {
    indicators.iter().copied().map(Sign::of).collect()
}

/// Errors that can occur when building a bracket.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BracketError {
    #[error("bracket bounds must be finite")]
    NonFinite,

    #[error("bracket is reversed: left {left} is after right {right}")]
    Reversed { left: f64, right: f64 },
}

/// A time interval known to contain a sign change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub left: f64,
    pub right: f64,
}

impl Bracket {
    /// Creates a bracket from time-ordered bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not finite or `left > right`.
    pub fn new(left: f64, right: f64) -> Result<Self, BracketError> {
        if !left.is_finite() || !right.is_finite() {
            return Err(BracketError::NonFinite);
        }
        if left > right {
            return Err(BracketError::Reversed { left, right });
        }
        Ok(Self { left, right })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.left + self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn sign_of_zero_is_positive() {
        assert_eq!(Sign::of(0.0), Sign::Positive);
        assert_eq!(Sign::of(-0.0), Sign::Positive);
        assert_eq!(Sign::of(-1e-300), Sign::Negative);
    }

    #[test]
    fn bracket_rejects_reversed_bounds() {
        assert_eq!(
            Bracket::new(2.0, 1.0),
            Err(BracketError::Reversed {
                left: 2.0,
                right: 1.0
            })
        );
        assert_eq!(Bracket::new(0.0, f64::NAN), Err(BracketError::NonFinite));
    }

    #[test]
    fn bracket_midpoint_and_width() {
        let bracket = Bracket::new(1.0, 2.0).expect("valid bracket");
        assert_relative_eq!(bracket.width(), 1.0);
        assert_relative_eq!(bracket.midpoint(), 1.5);
    }
}
