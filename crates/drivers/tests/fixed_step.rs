use std::f64::consts::PI;

use approx::assert_relative_eq;
use cosim_core::{VarType, units::Sine};
use cosim_drivers::{
    fixed_step::{Config, FixedStepDriver, FixedStepInterpolator, VariableStepDriver},
    io::InitValues,
};

fn start_values() -> InitValues {
    InitValues::new().with_reals(["omega"], [0.1 * PI])
}

#[test]
fn drivers_agree_on_grid_points() {
    let config = Config::new(0.0, 1.0);

    let mut interpolator = FixedStepInterpolator::new(Sine::with_fixed_step(1.0));
    interpolator
        .define_outputs(VarType::Real, ["x"])
        .expect("defined before init");
    interpolator
        .init("interpolated", &start_values(), &config)
        .expect("should initialize");

    let mut holding = FixedStepDriver::new(Sine::with_fixed_step(1.0));
    holding
        .define_outputs(VarType::Real, ["x"])
        .expect("defined before init");
    holding
        .init("held", &start_values(), &config)
        .expect("should initialize");

    for k in 0..6 {
        let t = f64::from(k);
        let a = interpolator.sync(t - 0.5, t).expect("should sync");
        let b = holding.sync(t - 0.5, t).expect("should sync");
        assert_relative_eq!(a, b);

        let interpolated = interpolator.get_real_outputs().expect("synced")[0];
        let held = holding.get_real_outputs().expect("synced")[0];
        assert_relative_eq!(interpolated, held, epsilon = 1e-12);
        assert_relative_eq!(held, (0.1 * PI * t).sin(), epsilon = 1e-12);
    }
}

#[test]
fn init_rejects_unknown_outputs() {
    let mut driver = FixedStepInterpolator::new(Sine::with_fixed_step(1.0));
    driver
        .define_outputs(VarType::Real, ["ERR"])
        .expect("defined before init");

    let err = driver
        .init("sine", &start_values(), &Config::default())
        .expect_err("unknown output");
    assert_eq!(err.failed_groups(), vec![VarType::Real]);
}

#[test]
fn variable_step_driver_follows_caller_steps() {
    let mut driver = VariableStepDriver::new(Sine::with_fixed_step(1.0));
    driver
        .define_outputs(VarType::Real, ["x"])
        .expect("defined before init");
    driver
        .init("variable", &start_values(), &Config::new(0.0, 2.0))
        .expect("should initialize");
    assert_eq!(driver.get_real_outputs().expect("initialized"), &[0.0]);

    let mut time = 0.0;
    while time <= 5.0 {
        let next = driver.sync(time, time + 1.0).expect("should sync");
        time += 1.0;

        assert_relative_eq!(next, time + 2.0);
        let x = driver.get_real_outputs().expect("synced")[0];
        assert_relative_eq!(x, (0.1 * PI * time).sin(), epsilon = 1e-8);
    }
}
