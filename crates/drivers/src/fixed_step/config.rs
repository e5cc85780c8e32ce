/// Grid of a fixed-step driver, or the default communication step of a
/// [`VariableStepDriver`](super::VariableStepDriver).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub start_time: f64,

    /// The unit's native step size. A variable-step driver adds it to the
    /// current communication point to suggest the next sync time.
    pub step: f64,

    /// Times closer than this to a grid point count as on it.
    pub time_diff_resolution: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            step: 1.0,
            time_diff_resolution: 1e-9,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(start_time: f64, step: f64) -> Self {
        Self {
            start_time,
            step,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the start time is not finite, or the step or
    /// resolution is not positive and finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.start_time.is_finite() {
            return Err("start time must be finite");
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err("step must be positive and finite");
        }
        if !self.time_diff_resolution.is_finite() || self.time_diff_resolution <= 0.0 {
            return Err("time resolution must be positive and finite");
        }
        if self.time_diff_resolution >= self.step {
            return Err("time resolution must be smaller than the step");
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
    fn rejects_bad_grids() {
        assert!(Config::new(f64::NAN, 1.0).validate().is_err());
        assert!(Config::new(0.0, 0.0).validate().is_err());
        assert!(Config::new(0.0, f64::INFINITY).validate().is_err());

        let coarse = Config {
            time_diff_resolution: 2.0,
            ..Config::default()
        };
        assert!(coarse.validate().is_err());
    }
}
