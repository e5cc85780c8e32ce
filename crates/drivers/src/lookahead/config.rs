use crate::event;

/// Configuration for a [`LookaheadScheduler`](super::LookaheadScheduler).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// How far past the committed time each prediction reaches.
    pub horizon: f64,

    /// Spacing of the buffered output samples.
    pub lookahead_step: f64,

    /// Largest step the unit is advanced by between indicator checks.
    pub integrator_step: f64,

    /// Times closer than this are treated as equal.
    pub time_diff_resolution: f64,

    /// Event search settings. The mode is always
    /// [`StopBeforeEvent`](event::EventMode::StopBeforeEvent).
    pub event: event::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            horizon: 1.0,
            lookahead_step: 0.1,
            integrator_step: 0.01,
            time_diff_resolution: 1e-9,
            event: event::Config::default(),
        }
    }
}

impl Config {
    /// Creates a config with the given step sizes and default tolerances.
    #[must_use]
    pub fn new(horizon: f64, lookahead_step: f64, integrator_step: f64) -> Self {
        Self {
            horizon,
            lookahead_step,
            integrator_step,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any step size or tolerance is not positive and
    /// finite, or the event config is invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.horizon) {
            return Err("horizon must be positive and finite");
        }
        if !positive(self.lookahead_step) {
            return Err("lookahead step must be positive and finite");
        }
        if !positive(self.integrator_step) {
            return Err("integrator step must be positive and finite");
        }
        if !positive(self.time_diff_resolution) {
            return Err("time resolution must be positive and finite");
        }
        self.event.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn new_keeps_default_tolerances() {
        let config = Config::new(0.005, 0.0025, 0.00125);
        assert_relative_eq!(config.time_diff_resolution, 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_horizon() {
        assert_eq!(
            Config::new(0.0, 0.1, 0.01).validate(),
            Err("horizon must be positive and finite")
        );
    }
}
