use crate::{event::EventRecord, io::TypedValues, snapshot::Snapshot};

/// Outputs and unit state at one predicted time.
#[derive(Debug, Clone)]
pub struct Sample<S> {
    pub(super) time: f64,
    pub(super) outputs: TypedValues,
    pub(super) snapshot: Snapshot<S>,
}

impl<S> Sample<S> {
    pub(super) fn new(time: f64, outputs: TypedValues, snapshot: Snapshot<S>) -> Self {
        Self {
            time,
            outputs,
            snapshot,
        }
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Output values, laid out in registration order.
    #[must_use]
    pub fn outputs(&self) -> &TypedValues {
        &self.outputs
    }
}

/// Where a requested time falls within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Position {
    /// Within resolution of the sample at this index.
    Exact(usize),

    /// Strictly between the sample at this index and the next one.
    Between(usize),
}

/// The buffered output trajectory of one prediction.
///
/// Samples are time-ordered and never empty. The first sample is the state
/// the prediction started from; the last one is either the end of the
/// horizon or, when [`truncated_by_event`](Self::truncated_by_event), the
/// left limit at the event time.
#[derive(Debug, Clone)]
pub struct PredictionWindow<S> {
    pub(super) samples: Vec<Sample<S>>,
    pub(super) event: Option<EventRecord>,
    pub(super) inputs: TypedValues,
}

impl<S> PredictionWindow<S> {
    /// Creates a window holding only `start`.
    pub(super) fn new(start: Sample<S>, inputs: TypedValues) -> Self {
        Self {
            samples: vec![start],
            event: None,
            inputs,
        }
    }

    pub(super) fn push(&mut self, sample: Sample<S>) {
        self.samples.push(sample);
    }

    pub(super) fn replace_last(&mut self, sample: Sample<S>) {
        let last = self.last_index();
        self.samples[last] = sample;
    }

    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.samples[0].time
    }

    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        self.last().time
    }

    /// Returns true if the prediction stopped at an event before the horizon.
    #[must_use]
    pub fn truncated_by_event(&self) -> bool {
        self.event.is_some()
    }

    /// The event the window was truncated by.
    #[must_use]
    pub fn event(&self) -> Option<&EventRecord> {
        self.event.as_ref()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample<S>] {
        &self.samples
    }

    /// Input values the prediction was made with.
    #[must_use]
    pub fn inputs(&self) -> &TypedValues {
        &self.inputs
    }

    pub(super) fn last(&self) -> &Sample<S> {
        &self.samples[self.samples.len() - 1]
    }

    pub(super) fn last_index(&self) -> usize {
        self.samples.len() - 1
    }

    /// Locates `time`, treating times within `resolution` as equal.
    pub(super) fn resolve(&self, time: f64, resolution: f64) -> Option<Position> {
        if time < self.lower_bound() - resolution || time > self.upper_bound() + resolution {
            return None;
        }

        for (index, sample) in self.samples.iter().enumerate().rev() {
            if (time - sample.time).abs() <= resolution {
                return Some(Position::Exact(index));
            }
            if sample.time < time {
                return Some(Position::Between(index));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cosim_core::{SimulationUnit, units::Sine};

    use crate::snapshot::SnapshotStore;

    fn window(times: &[f64]) -> PredictionWindow<Sine> {
        let store = SnapshotStore::new();
        let mut unit = Sine::new();
        unit.initialize(times[0]).expect("should initialize");

        let sample = |unit: &Sine| Sample::new(unit.time(), TypedValues::default(), store.save(unit));
        let mut window = PredictionWindow::new(sample(&unit), TypedValues::default());
        for &t in &times[1..] {
            unit.advance(t).expect("should advance");
            window.push(sample(&unit));
        }
        window
    }

    #[test]
    fn resolves_exact_and_between() {
        let window = window(&[0.0, 0.3, 0.6]);
        let res = 1e-9;

        assert_eq!(window.resolve(0.0, res), Some(Position::Exact(0)));
        assert_eq!(window.resolve(0.3 + 1e-10, res), Some(Position::Exact(1)));
        assert_eq!(window.resolve(0.45, res), Some(Position::Between(1)));
        assert_eq!(window.resolve(0.1, res), Some(Position::Between(0)));
        assert_eq!(window.resolve(0.6 + 5e-10, res), Some(Position::Exact(2)));
    }

    #[test]
    fn rejects_times_outside_bounds() {
        let window = window(&[1.0, 1.5]);
        assert_eq!(window.resolve(0.9, 1e-9), None);
        assert_eq!(window.resolve(1.5 + 1e-6, 1e-9), None);
        assert!(!window.truncated_by_event());
    }
}
