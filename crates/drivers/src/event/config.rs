/// What the localizer does once an event is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventMode {
    /// Return at the event time with the event left unhandled.
    #[default]
    StopBeforeEvent,

    /// Handle the event and continue to the requested time.
    StepOverEvent,
}

/// Configuration for event localization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Maximum number of bisection trials per event.
    pub max_iters: usize,

    /// Bracket width below which an event counts as located.
    pub precision: f64,

    pub mode: EventMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 100,
            precision: 1e-10,
            mode: EventMode::StopBeforeEvent,
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero or `precision` is not
    /// positive and finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_iters == 0 {
            return Err("max_iters must be at least 1");
        }
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err("precision must be positive and finite");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_precision() {
        for precision in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            let config = Config {
                precision,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "precision {precision}");
        }
    }
}
