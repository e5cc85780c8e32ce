//! Core traits and types for driving simulation units.
//!
//! This crate defines the shared abstractions the drivers build on:
//!
//! - [`SimulationUnit`]: a unit that advances in time, exposes typed
//!   variables and event indicators, and can save and restore its state
//! - [`Value`] and [`VarType`]: typed variable values
//! - [`Status`]: ordinal outcome of a call, ordered by severity
//! - [`Observer`]: receives driver events and optionally returns control actions
//! - [`units`]: reference units with closed-form dynamics

mod observer;
mod status;
mod unit;
mod value;

pub mod units;

pub use observer::Observer;
pub use status::Status;
pub use unit::SimulationUnit;
pub use value::{Value, ValueError, VarType};
