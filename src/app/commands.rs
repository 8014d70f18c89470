//! Inbound console commands and the sensor's control surface.
//!
//! Two commands are multiplexed on `SENSOR=<name>` so several hoppers can
//! share one console:
//!
//! | Command                                   | Effect                         |
//! |-------------------------------------------|--------------------------------|
//! | `QUERY_FILAMENT_SENSOR SENSOR=<name>`     | report instantaneous detection |
//! | `SET_FILAMENT_SENSOR SENSOR=<name> ENABLE=<0/1>` | enable / disable dispatch |

use core::fmt::Write;

use log::info;

use crate::error::{Error, Result};

use super::ports::{CommandChannel, PrintStateProvider};
use super::service::PelletSensor;

pub const QUERY_COMMAND: &str = "QUERY_FILAMENT_SENSOR";
pub const SET_COMMAND: &str = "SET_FILAMENT_SENSOR";
pub const MUX_KEY: &str = "SENSOR";
pub const ENABLE_PARAM: &str = "ENABLE";

const QUERY_HELP: &str = "Query the status of the pellet Sensor";
const SET_HELP: &str = "Sets the pellet sensor on/off";

const MAX_PARAMS: usize = 8;

/// Human-readable reply text.
pub type StatusLine = heapless::String<64>;

/// A command announced to the [`CommandChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: &'static str,
    pub mux_key: &'static str,
    pub mux_value: String,
    pub help: &'static str,
}

// ───────────────────────────────────────────────────────────────
// Command line parsing
// ───────────────────────────────────────────────────────────────

/// `NAME KEY=VALUE ...`, names and keys matched case-insensitively.
#[derive(Debug)]
pub struct GcodeCommand<'a> {
    name: &'a str,
    params: heapless::Vec<(&'a str, &'a str), MAX_PARAMS>,
}

impl<'a> GcodeCommand<'a> {
    pub fn parse(line: &'a str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or(Error::InvalidParameter("empty command"))?;

        let mut params = heapless::Vec::new();
        for word in words {
            let (key, value) = word
                .split_once('=')
                .ok_or(Error::InvalidParameter("expected KEY=VALUE"))?;
            if key.is_empty() {
                return Err(Error::InvalidParameter("empty parameter name"));
            }
            params
                .push((key, value))
                .map_err(|_| Error::InvalidParameter("too many parameters"))?;
        }

        Ok(Self { name, params })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn is(&self, command: &str) -> bool {
        self.name.eq_ignore_ascii_case(command)
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }

    /// Integer parameter with a default when absent.
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .parse()
                .map_err(|_| Error::InvalidParameter("expected an integer")),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Control surface
// ───────────────────────────────────────────────────────────────

/// Query/enable operations for one sensor.  No timers are exposed.
pub struct ControlSurface<'a, P> {
    sensor: &'a PelletSensor<P>,
}

impl<'a, P: PrintStateProvider> ControlSurface<'a, P> {
    pub fn new(sensor: &'a PelletSensor<P>) -> Self {
        Self { sensor }
    }

    pub fn command_specs(&self) -> [CommandSpec; 2] {
        let spec = |command: &'static str, help: &'static str| CommandSpec {
            command,
            mux_key: MUX_KEY,
            mux_value: self.sensor.name().to_string(),
            help,
        };
        [spec(QUERY_COMMAND, QUERY_HELP), spec(SET_COMMAND, SET_HELP)]
    }

    pub fn register(&self, channel: &mut impl CommandChannel) {
        for spec in self.command_specs() {
            channel.register_mux_command(spec);
        }
    }

    /// `Pellet Sensor <name>: pellet detected` / `... not detected`.
    pub fn query(&self, now_ms: u64) -> StatusLine {
        let status = self.sensor.get_status(now_ms);
        let mut line = StatusLine::new();
        let _ = write!(
            line,
            "Pellet Sensor {}: {}",
            self.sensor.name(),
            if status.filament_detected {
                "pellet detected"
            } else {
                "pellet not detected"
            }
        );
        line
    }

    /// `{"filament_detected":..,"enabled":..}` for status aggregation.
    pub fn status_json(&self, now_ms: u64) -> Result<String> {
        serde_json::to_string(&self.sensor.get_status(now_ms))
            .map_err(|_| Error::Config("status serialisation failed"))
    }

    /// Any non-zero value enables.
    pub fn set(&self, enable: i64) {
        self.sensor.set_enabled(enable != 0);
    }

    /// Run one console line.  `Ok(None)` means the line was not addressed
    /// to this sensor.  A malformed parameter leaves the sensor untouched.
    pub fn execute(&self, line: &str, now_ms: u64) -> Result<Option<StatusLine>> {
        let cmd = GcodeCommand::parse(line)?;
        if !cmd.is(QUERY_COMMAND) && !cmd.is(SET_COMMAND) {
            return Ok(None);
        }
        if cmd.get(MUX_KEY) != Some(self.sensor.name()) {
            return Ok(None);
        }

        if cmd.is(QUERY_COMMAND) {
            return Ok(Some(self.query(now_ms)));
        }

        let enable = cmd.get_int(ENABLE_PARAM, 1)?;
        self.set(enable);
        info!("{} {}={}", SET_COMMAND, ENABLE_PARAM, enable);

        let mut line = StatusLine::new();
        let _ = write!(
            line,
            "Pellet Sensor {}: {}",
            self.sensor.name(),
            if enable != 0 { "enabled" } else { "disabled" }
        );
        Ok(Some(line))
    }
}
