use approx::assert_relative_eq;

use cosim_core::{
    SimulationUnit, Status, Value, VarType,
    units::{StepAt, Zigzag},
};

use crate::io::{InitError, InitValues, TypedValues};

use super::{Config, Error, LookaheadScheduler, Phase, UNSET_TIME};

/// Zigzag with slope `k`, outputs `x` and `der(x)`, steps of 0.3 and a
/// horizon of two steps.
fn scheduler(k: f64) -> LookaheadScheduler<Zigzag> {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    scheduler
        .define_real_outputs(["x", "der(x)"])
        .expect("defined before init");
    scheduler
        .init(
            "zigzag",
            &InitValues::new().with_reals(["k", "x"], [k, 0.0]),
            0.0,
            &Config::new(0.6, 0.3, 0.15),
        )
        .expect("should initialize");
    scheduler
}

fn x(scheduler: &LookaheadScheduler<Zigzag>) -> f64 {
    scheduler.get_real_outputs().expect("synced")[0]
}

fn der(scheduler: &LookaheadScheduler<Zigzag>) -> f64 {
    scheduler.get_real_outputs().expect("synced")[1]
}

#[test]
fn commits_initial_outputs() {
    let scheduler = scheduler(10.0);

    assert_eq!(scheduler.phase(), Phase::Initialized);
    assert_eq!(scheduler.instance_name(), "zigzag");
    assert_eq!(scheduler.get_real_outputs().expect("synced"), &[0.0, 10.0]);
    assert_eq!(scheduler.committed_time(), Some(0.0));
}

#[test]
fn reads_before_init_are_rejected() {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());

    let err = scheduler.get_real_outputs().expect_err("not initialized");
    assert!(matches!(err, Error::NotSynced));
    assert_eq!(err.status(), Status::Discard);
    assert!(matches!(scheduler.sync(UNSET_TIME, 0.0), Err(Error::NotSynced)));
}

#[test]
fn variables_are_fixed_after_init() {
    let mut scheduler = scheduler(1.0);
    assert!(matches!(
        scheduler.define_integer_outputs(["crossings"]),
        Err(Error::AlreadyInitialized)
    ));
    assert!(matches!(
        scheduler.init("again", &InitValues::new(), 0.0, &Config::default()),
        Err(InitError::AlreadyInitialized)
    ));
}

#[test]
fn answers_from_window_until_upper_bound() {
    let mut scheduler = scheduler(1.0);

    let next = scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    assert_relative_eq!(next, 0.6);

    let next = scheduler.sync(0.0, 0.3).expect("should sync");
    assert_relative_eq!(next, 0.6);
    assert_relative_eq!(x(&scheduler), 0.3, epsilon = 1e-12);
    assert_eq!(scheduler.phase(), Phase::Synchronized);

    // Landing on the upper bound predicts again, up to the event at x = 1.
    let next = scheduler.sync(0.3, 0.6).expect("should sync");
    assert_relative_eq!(next, 1.0, epsilon = 1e-9);
    let window = scheduler.window().expect("live window");
    assert!(window.truncated_by_event());
    assert_relative_eq!(window.lower_bound(), 0.6, epsilon = 1e-12);
}

#[test]
fn commits_between_samples_and_rolls_back_within_window() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    let next = scheduler.sync(0.0, 0.45).expect("should sync");
    assert_relative_eq!(next, 0.6);
    assert_relative_eq!(x(&scheduler), 0.45, epsilon = 1e-12);

    let next = scheduler.sync(0.45, 0.15).expect("should roll back");
    assert_relative_eq!(next, 0.6);
    assert_relative_eq!(x(&scheduler), 0.15, epsilon = 1e-12);
    assert_relative_eq!(scheduler.get_real("x").expect("x"), 0.15, epsilon = 1e-12);
}

#[test]
fn repeated_sync_is_idempotent() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    scheduler.sync(0.0, 0.3).expect("should sync");
    let before = scheduler.outputs().expect("synced").clone();

    let next = scheduler.sync(0.3, 0.3).expect("should sync");
    assert_relative_eq!(next, 0.6);
    assert_eq!(scheduler.outputs().expect("synced"), &before);
}

#[test]
fn rejects_time_before_window() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    scheduler.sync(0.0, 0.6).expect("should sync");

    let err = scheduler.sync(0.6, 0.3).expect_err("window starts at 0.6");
    assert!(matches!(err, Error::OutsideWindow { .. }));
    assert_eq!(err.status(), Status::Discard);
}

#[test]
fn steps_to_and_over_state_event() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    scheduler.sync(0.0, 0.6).expect("should sync");

    let event_time = scheduler.sync(0.6, 1.0).expect("step to event");
    assert_relative_eq!(event_time, 1.0, epsilon = 1e-9);
    assert!(scheduler.event_flag());
    assert_relative_eq!(der(&scheduler), 1.0);
    assert!(scheduler.last_event().is_none());

    let next = scheduler
        .sync(event_time, event_time)
        .expect("step over event");
    assert_relative_eq!(next, 1.6, epsilon = 1e-9);
    assert!(!scheduler.event_flag());

    // Outputs keep the left limit until the next commit.
    assert_relative_eq!(der(&scheduler), 1.0);
    let event = scheduler.last_event().expect("event was handled");
    assert!(event.consumed);
    assert_relative_eq!(event.time, event_time);

    scheduler.sync(event_time, 1.3).expect("should sync");
    assert_relative_eq!(der(&scheduler), -1.0);
    assert_relative_eq!(x(&scheduler), 0.7, epsilon = 1e-8);
}

#[test]
fn cleared_event_flag_skips_event_iteration() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    scheduler.sync(0.0, 0.6).expect("should sync");
    let event_time = scheduler.sync(0.6, 1.0).expect("step to event");

    scheduler.set_event_flag(false);
    assert!(!scheduler.event_flag());
    assert!(!scheduler.window().expect("live window").truncated_by_event());

    scheduler
        .sync(event_time, event_time)
        .expect("predicts without handling");
    scheduler.sync(event_time, 1.3).expect("should sync");
    assert_relative_eq!(x(&scheduler), 1.3, epsilon = 1e-8);
    assert_relative_eq!(der(&scheduler), 1.0);
}

#[test]
fn late_sync_catches_up_over_events() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    let next = scheduler.sync(0.0, 2.0).expect("should catch up");
    assert_relative_eq!(next, 2.6, epsilon = 1e-8);
    assert_relative_eq!(x(&scheduler), 0.0, epsilon = 1e-8);
    assert_relative_eq!(der(&scheduler), -1.0);

    let event = scheduler.last_event().expect("event at x = 1");
    assert_relative_eq!(event.time, 1.0, epsilon = 1e-9);
}

#[test]
fn predict_state_does_not_sync() {
    let mut scheduler = scheduler(1.0);

    let next = scheduler.predict_state(UNSET_TIME, 0.0).expect("should predict");
    assert_relative_eq!(next, 0.6);
    assert_eq!(scheduler.phase(), Phase::Predicting);

    let committed = scheduler.update_state(0.3).expect("should update");
    assert_relative_eq!(committed, 0.3);
    assert_relative_eq!(x(&scheduler), 0.3, epsilon = 1e-12);
    assert_eq!(scheduler.phase(), Phase::Synchronized);
}

#[test]
fn changed_inputs_apply_from_the_end_of_the_interval() {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    scheduler.define_real_inputs(["k"]).expect("defined before init");
    scheduler.define_real_outputs(["x"]).expect("defined before init");
    scheduler
        .init(
            "zigzag",
            &InitValues::new().with_reals(["k"], [1.0]),
            0.0,
            &Config::new(0.6, 0.3, 0.15),
        )
        .expect("should initialize");
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    let faster = TypedValues {
        real: vec![2.0],
        ..TypedValues::default()
    };
    let next = scheduler
        .sync_with_inputs(0.0, 0.3, &faster)
        .expect("should sync");

    // x(0.3) still follows k = 1; afterwards x = 0.3 + 2 (t - 0.3) hits 1 at 0.65.
    assert_relative_eq!(x(&scheduler), 0.3, epsilon = 1e-12);
    assert_relative_eq!(next, 0.65, epsilon = 1e-9);

    scheduler.sync(0.3, 0.6).expect("should sync");
    assert_relative_eq!(x(&scheduler), 0.9, epsilon = 1e-9);
}

#[test]
fn rejects_misshapen_inputs() {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    scheduler.define_real_inputs(["k"]).expect("defined before init");

    let err = scheduler
        .set_inputs(&TypedValues::default())
        .expect_err("one real input is registered");
    assert!(matches!(
        err,
        Error::InputShape {
            group: VarType::Real,
            expected: 1,
            got: 0
        }
    ));
}

#[test]
fn passthrough_write_forces_new_prediction() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    scheduler.set_real("k", 3.0).expect("k is writable");
    let next = scheduler.sync(0.0, 0.3).expect("should sync");

    assert_relative_eq!(x(&scheduler), 0.9, epsilon = 1e-12);
    assert_relative_eq!(next, 1.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn init_reports_each_failing_group() {
    let cases = [
        (
            InitValues::new().with_reals(["ERR"], [0.0]),
            VarType::Real,
        ),
        (
            InitValues::new().with_integers(["ERR"], [0]),
            VarType::Integer,
        ),
        (
            InitValues::new().with_booleans(["ERR"], [false]),
            VarType::Boolean,
        ),
        (
            InitValues::new().with_strings(["ERR_STRING"], ["ERR_STRING"]),
            VarType::String,
        ),
    ];

    for (values, group) in cases {
        let mut scheduler = LookaheadScheduler::new(Zigzag::new());
        let err = scheduler
            .init("zigzag", &values, 0.0, &Config::default())
            .expect_err("unknown variable");

        assert_eq!(err.failed_groups(), vec![group]);
        assert_eq!(err.status(), Status::Error);
        assert_eq!(scheduler.phase(), Phase::Uninitialized);
    }
}

#[test]
fn init_checks_all_groups_after_a_failure() {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    scheduler
        .define_string_outputs(["ERR_STRING"])
        .expect("defined before init");

    let values = InitValues::new()
        .with_reals(["k", "x"], [1.0])
        .with_integers(["crossings"], [3]);
    let err = scheduler
        .init("zigzag", &values, 0.0, &Config::default())
        .expect_err("three groups fail");

    assert_eq!(
        err.failed_groups(),
        vec![VarType::Real, VarType::Integer, VarType::String]
    );
}

#[test]
fn init_rejects_invalid_config() {
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    let config = Config::new(1.0, -0.1, 0.01);

    assert!(matches!(
        scheduler.init("zigzag", &InitValues::new(), 0.0, &config),
        Err(InitError::InvalidConfig { .. })
    ));
}

/// A [`StepAt`] whose event iteration leaves the time event due.
struct Stuck(StepAt);

impl SimulationUnit for Stuck {
    type State = StepAt;
    type Error = <StepAt as SimulationUnit>::Error;

    fn time(&self) -> f64 {
        self.0.time()
    }

    fn get(&self, name: &str, var_type: VarType) -> Result<Value, Self::Error> {
        self.0.get(name, var_type)
    }

    fn set(&mut self, name: &str, value: &Value) -> Result<(), Self::Error> {
        self.0.set(name, value)
    }

    fn initialize(&mut self, start_time: f64) -> Result<(), Self::Error> {
        self.0.initialize(start_time)
    }

    fn advance(&mut self, to: f64) -> Result<f64, Self::Error> {
        self.0.advance(to)
    }

    fn event_indicators(&self) -> Result<Vec<f64>, Self::Error> {
        self.0.event_indicators()
    }

    fn next_time_event(&self) -> Option<f64> {
        self.0.next_time_event()
    }

    fn handle_events(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn save_state(&self) -> StepAt {
        self.0.save_state()
    }

    fn restore_state(&mut self, state: &StepAt) -> Result<(), Self::Error> {
        self.0.restore_state(state)
    }
}

#[test]
fn steps_over_event_on_a_sample_boundary() {
    // x reaches 1 a picosecond after the sample at t = 1.
    let mut scheduler = LookaheadScheduler::new(Zigzag::new());
    scheduler
        .define_real_outputs(["x", "der(x)"])
        .expect("defined before init");
    scheduler
        .init(
            "zigzag",
            &InitValues::new().with_reals(["k", "x0"], [1.0, -1e-12]),
            0.0,
            &Config::new(0.5, 0.25, 0.125),
        )
        .expect("should initialize");

    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    let next = scheduler.sync(0.0, 0.5).expect("should sync");
    assert_relative_eq!(next, 1.0);
    let event_time = scheduler.sync(0.5, 1.0).expect("should sync");
    assert_relative_eq!(event_time, 1.0, epsilon = 1e-9);
    assert!(scheduler.window().expect("live window").truncated_by_event());

    let next = scheduler.sync(1.0, event_time).expect("step to event");
    assert_relative_eq!(next, event_time);
    assert!(scheduler.event_flag());

    let next = scheduler
        .sync(event_time, event_time)
        .expect("step over event");
    assert_relative_eq!(next, 1.5, epsilon = 1e-9);
    assert!(!scheduler.event_flag());

    scheduler.sync(event_time, 1.25).expect("should sync");
    assert_relative_eq!(der(&scheduler), -1.0);
    assert_relative_eq!(x(&scheduler), 0.75, epsilon = 1e-8);
}

#[test]
fn event_that_survives_its_iteration_is_an_error() {
    let mut scheduler = LookaheadScheduler::new(Stuck(StepAt::new()));
    scheduler
        .init(
            "stuck",
            &InitValues::new().with_reals(["t0"], [0.5]),
            0.0,
            &Config::new(0.6, 0.3, 0.15),
        )
        .expect("should initialize");

    let event_time = scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    assert_relative_eq!(event_time, 0.5);
    scheduler.sync(0.0, event_time).expect("step to event");

    let err = scheduler
        .sync(event_time, event_time)
        .expect_err("event is still due");
    assert!(matches!(err, Error::Stalled { time } if (time - 0.5).abs() < 1e-9));
    assert_eq!(err.status(), Status::Error);
}

#[test]
fn rejects_non_finite_times() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    for time in [f64::INFINITY, f64::NAN] {
        let err = scheduler.sync(0.0, time).expect_err("not a finite time");
        assert!(matches!(err, Error::InvalidTime { .. }));
        assert_eq!(err.status(), Status::Discard);
    }
    assert!(matches!(
        scheduler.predict_state(0.0, f64::NAN),
        Err(Error::InvalidTime { .. })
    ));
    assert!(matches!(
        scheduler.update_state_from_the_right(f64::INFINITY),
        Err(Error::InvalidTime { .. })
    ));
    assert_eq!(scheduler.committed_time(), Some(0.0));
}

#[test]
fn predict_state_always_predicts_again() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");

    let matched = scheduler.predict_state(0.0, 0.3).expect("should predict");
    let unset = scheduler.predict_state(UNSET_TIME, 0.3).expect("should predict");

    assert_relative_eq!(matched, 0.9, epsilon = 1e-12);
    assert_relative_eq!(unset, matched);
    assert_relative_eq!(scheduler.window().expect("live window").lower_bound(), 0.3);
}

#[test]
fn right_limit_is_committed_one_resolution_late() {
    let mut scheduler = scheduler(1.0);
    scheduler.sync(UNSET_TIME, 0.0).expect("should sync");
    scheduler.sync(0.0, 0.6).expect("should sync");
    let event_time = scheduler.sync(0.6, 1.0).expect("step to event");

    let committed = scheduler
        .update_state_from_the_right(event_time)
        .expect("should update");

    let resolution = scheduler.config().time_diff_resolution;
    assert_relative_eq!(committed, event_time + resolution, epsilon = 1e-15);
    assert_relative_eq!(der(&scheduler), -1.0);
    assert!(scheduler.last_event().is_some_and(|event| event.consumed));
}
