//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the orchestration for one pellet hopper sensor:
//! the lock-guarded shared sensor, the periodic evaluator, and the
//! command surface.  All interaction with the printer host happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
