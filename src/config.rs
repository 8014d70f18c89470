//! Sensor configuration parameters
//!
//! All tunable parameters for one pellet hopper switch.  Loaded from a
//! JSON section at startup; every field has a default so partial
//! documents are accepted.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest accepted sensor name (it appears in every status line).
pub const MAX_NAME_LEN: usize = 24;

/// Pause must have time to take effect before the runout script runs.
pub const MIN_PAUSE_DELAY_MS: u64 = 500;

/// Per-sensor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Mux value for `SENSOR=<name>` on the command channel.
    pub name: String,

    // --- Timing ---
    /// How long the switch must hold a level before it counts as settled.
    pub debounce_interval_ms: u64,
    /// Evaluator cadence (milliseconds).
    pub tick_interval_ms: u64,

    // --- Runout handling ---
    /// Pause the print before running the runout script.
    pub pause_on_runout: bool,
    /// Delay between the pause request and the runout script body.
    pub pause_delay_ms: u64,

    // --- Scripts ---
    pub runout_gcode: String,
    pub filled_up_gcode: String,
    pub emergency_gcode: String,

    // --- Hardware ---
    /// Treat a low switch level as "hopper full".
    pub invert_switch: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            name: "hopper".into(),

            debounce_interval_ms: 1000,
            tick_interval_ms: 100, // 10 Hz

            pause_on_runout: true,
            pause_delay_ms: MIN_PAUSE_DELAY_MS,

            runout_gcode: String::new(),
            filled_up_gcode: String::new(),
            emergency_gcode: String::new(),

            invert_switch: false,
        }
    }
}

impl SensorConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("Sensor config parse failed: {}", e);
            Error::Config("malformed JSON")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.  Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("name must not be empty"));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(Error::Config("name longer than 24 characters"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(Error::Config("name must not contain whitespace"));
        }
        if self.debounce_interval_ms == 0 {
            return Err(Error::Config("debounce_interval_ms must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0"));
        }
        if self.tick_interval_ms > self.debounce_interval_ms {
            return Err(Error::Config("tick_interval_ms exceeds debounce_interval_ms"));
        }
        if self.pause_delay_ms < MIN_PAUSE_DELAY_MS {
            return Err(Error::Config("pause_delay_ms must be >= 500"));
        }
        Ok(())
    }
}
