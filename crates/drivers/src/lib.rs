//! Drivers for simulation units in a co-simulation.
//!
//! The drivers wrap a [`SimulationUnit`] and decide how far it integrates,
//! when it is rolled back, and which outputs the caller sees:
//!
//! - [`lookahead`]: predicts a unit ahead of the caller, buffers its outputs
//!   and stops predictions at events
//! - [`rollback`]: integrates a unit to any time, forward or backward
//! - [`fixed_step`]: steps units that only accept one native step size
//!
//! The building blocks are public too:
//!
//! - [`snapshot`]: save and restore a unit's full state
//! - [`event`]: locate state events by bisection and step over time events
//! - [`io`]: typed variable sets, value vectors and start values
//!
//! [`SimulationUnit`]: cosim_core::SimulationUnit

pub mod event;
pub mod fixed_step;
pub mod io;
pub mod lookahead;
pub mod rollback;
pub mod snapshot;
