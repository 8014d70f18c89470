//! Pellet hopper sensor library.
//!
//! Exposes the debounce core, the dispatcher and the port adapters for
//! integration testing and for the firmware binary.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod gate;
pub mod scheduler;

pub use app::service::{Evaluator, PelletSensor};
pub use config::SensorConfig;
pub use error::{Error, Result};
