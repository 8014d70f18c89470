//! Event dispatcher and feeder actuator state.
//!
//! Every settled transition ends up here as one [`SensorEvent`].  The
//! dispatcher:
//!
//! 1. updates [`FeederState`] synchronously (filled-up and emergency turn
//!    the feeder off, runout turns it on),
//! 2. for a runout with pausing configured, requests a pause and suspends
//!    on the scheduler clock before the script body runs,
//! 3. renders the configured template, appends the [`SYNC_MARKER`] and
//!    hands it to the [`ScriptRunner`].
//!
//! Script failures are logged and returned to the caller as a value; they
//! never unwind through the debounce cycle.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

use crate::app::ports::{Clock, PauseController, ScriptRunner};
use crate::config::SensorConfig;
use crate::debounce::Transition;
use crate::error::ScriptError;

/// Appended to every script so its completion is observable before the
/// next action is taken.
pub const SYNC_MARKER: &str = "M400";

/// Prefixed to the runout script when the print was paused first.
pub const PAUSE_PREFIX: &str = "PAUSE\n";

/// The three named sensor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    FilledUp,
    Runout,
    /// Caller-invoked stop, never derived from the switch level.
    Emergency,
}

impl SensorEvent {
    /// Feeder level this event leaves behind.
    pub const fn feeder_on(self) -> bool {
        matches!(self, Self::Runout)
    }
}

impl From<Transition> for SensorEvent {
    /// The corrective path re-uses the filled-up handler: both end with
    /// the feeder off.
    fn from(t: Transition) -> Self {
        match t {
            Transition::FilledUp { .. } | Transition::ForceOff => Self::FilledUp,
            Transition::Runout { .. } => Self::Runout,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator state
// ───────────────────────────────────────────────────────────────

/// "Feeder enabled" output.  Safe default is off.
///
/// Lock-free so the observation context, the evaluator and relay
/// drivers can all read it without touching the debounce lock.
#[derive(Debug, Default)]
pub struct FeederState(AtomicBool);

impl FeederState {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns `true` if the level actually changed.
    pub fn set(&self, on: bool) -> bool {
        let was = self.0.swap(on, Ordering::AcqRel);
        if was != on {
            debug!("Feeder {}", if on { "ON" } else { "OFF" });
        }
        was != on
    }

    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

struct ScriptSet {
    filled_up: String,
    runout: String,
    emergency: String,
}

pub struct EventDispatcher<R, Z, C> {
    runner: R,
    pause: Z,
    clock: C,
    scripts: ScriptSet,
    pause_on_runout: bool,
    pause_delay_ms: u64,
}

impl<R, Z, C> EventDispatcher<R, Z, C>
where
    R: ScriptRunner,
    Z: PauseController,
    C: Clock,
{
    pub fn new(config: &SensorConfig, runner: R, pause: Z, clock: C) -> Self {
        Self {
            runner,
            pause,
            clock,
            scripts: ScriptSet {
                filled_up: config.filled_up_gcode.clone(),
                runout: config.runout_gcode.clone(),
                emergency: config.emergency_gcode.clone(),
            },
            pause_on_runout: config.pause_on_runout,
            pause_delay_ms: config.pause_delay_ms,
        }
    }

    /// Fire `event`: feeder first, then the scripted side effect.
    pub async fn dispatch(
        &mut self,
        event: SensorEvent,
        feeder: &FeederState,
    ) -> Result<(), ScriptError> {
        feeder.set(event.feeder_on());
        info!("Triggered {:?} event", event);

        let mut prefix = "";
        if event == SensorEvent::Runout && self.pause_on_runout {
            match self.pause.request_pause() {
                Ok(()) => {
                    prefix = PAUSE_PREFIX;
                    let deadline = self.clock.now_ms().saturating_add(self.pause_delay_ms);
                    self.clock.sleep_until(deadline).await;
                }
                Err(e) => warn!("Runout pause skipped: {}", e),
            }
        }

        let result = self.exec(prefix, event);
        if let Err(e) = &result {
            error!("Script running error ({:?}): {}", event, e);
        }
        result
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn exec(&mut self, prefix: &str, event: SensorEvent) -> Result<(), ScriptError> {
        let template = match event {
            SensorEvent::FilledUp => &self.scripts.filled_up,
            SensorEvent::Runout => &self.scripts.runout,
            SensorEvent::Emergency => &self.scripts.emergency,
        };
        let body = self.runner.render(template)?;
        let script = format!("{prefix}{body}\n{SYNC_MARKER}");
        self.runner.run_script(&script)
    }
}
