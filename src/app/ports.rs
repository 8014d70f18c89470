//! Port traits — the hexagonal boundary between the sensor core and the
//! printer host.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PelletSensor / Evaluator (domain)
//! ```
//!
//! The scripting engine, print-state tracker, pause/resume subsystem,
//! clock and command registry all live outside this crate.  The domain
//! core only ever sees them through these narrow traits, which keeps the
//! debounce and dispatch logic testable with mock adapters.

use core::future::Future;

use crate::error::{Result, ScriptError};

// ───────────────────────────────────────────────────────────────
// Print state (driven adapter: printer → domain)
// ───────────────────────────────────────────────────────────────

/// Coarse printer mode as far as feeder actuation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Printing,
    Other,
}

/// Snapshot query against the print-job tracker.
///
/// Returning an error means the tracker could not answer; callers treat
/// that as [`OperatingMode::Other`].
pub trait PrintStateProvider {
    fn current_mode(&self, now_ms: u64) -> Result<OperatingMode>;
}

impl<T: PrintStateProvider + ?Sized> PrintStateProvider for std::sync::Arc<T> {
    fn current_mode(&self, now_ms: u64) -> Result<OperatingMode> {
        (**self).current_mode(now_ms)
    }
}

impl<T: PrintStateProvider + ?Sized> PrintStateProvider for &T {
    fn current_mode(&self, now_ms: u64) -> Result<OperatingMode> {
        (**self).current_mode(now_ms)
    }
}

// ───────────────────────────────────────────────────────────────
// Script runner (driven adapter: domain → scripting engine)
// ───────────────────────────────────────────────────────────────

/// Renders a configured template and runs the resulting script.
pub trait ScriptRunner {
    /// Expand a template into script text.
    fn render(&mut self, template: &str) -> core::result::Result<String, ScriptError>;

    /// Run rendered script text.  Returns once the script was accepted.
    fn run_script(&mut self, script: &str) -> core::result::Result<(), ScriptError>;
}

// ───────────────────────────────────────────────────────────────
// Pause controller (driven adapter: domain → pause/resume)
// ───────────────────────────────────────────────────────────────

pub trait PauseController {
    /// Ask the printer to pause the running job.
    fn request_pause(&mut self) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: domain ↔ scheduler)
// ───────────────────────────────────────────────────────────────

/// Monotonic scheduler clock with a suspend primitive.
///
/// Both the evaluator cadence and the runout pause delay are measured
/// on this clock, never on the caller's.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Resolve once `now_ms() >= deadline_ms`.
    fn sleep_until(&self, deadline_ms: u64) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / console)
// ───────────────────────────────────────────────────────────────

/// The evaluator emits [`AppEvent`](super::events::AppEvent)s through
/// this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Command channel (driving adapter: console → domain)
// ───────────────────────────────────────────────────────────────

/// Registry the [`ControlSurface`](super::commands::ControlSurface)
/// announces its commands to.
pub trait CommandChannel {
    fn register_mux_command(&mut self, spec: super::commands::CommandSpec);
}
