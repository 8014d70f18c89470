//! Time-window debounce engine for the hopper level switch.
//!
//! ## Pipeline
//!
//! ```text
//!  observe(raw) ──▶ raw_value ──▶ tick(now) ──▶ Option<Transition>
//!                     │              │
//!                     │   changed?  ─┴─▶ last_change_ms = now, action_taken = false
//!                     │   settled?  ───▶ FilledUp / Runout, action_taken = true
//!                     ▼
//!                 detected (instantaneous, always recorded)
//! ```
//!
//! The engine is pure: it never calls a collaborator.  The caller holds
//! the lock around it, takes the returned [`Transition`], releases the
//! lock, and only then dispatches.
//!
//! ## Operating mode
//!
//! Outside a print the raw value is not latched.  An observation or tick
//! that finds the feeder on (or the latched level empty) yields
//! [`Transition::ForceOff`] instead of tracking the signal.  When printing
//! resumes the latched level is resynchronised from the last detection so
//! the pipeline never acts on a level that went stale while idle.

use serde::Serialize;

/// Everything the engine tracks between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceState {
    /// Level latched into the debounce pipeline (true = hopper full).
    pub raw_value: bool,
    /// Level seen by the previous tick; `None` before the first tick.
    pub last_raw_value: Option<bool>,
    /// When `raw_value` last changed, in clock milliseconds.
    pub last_change_ms: u64,
    /// Set once the settled level has been acted on.
    pub action_taken: bool,
    pub enabled: bool,
    /// Most recent observation, latched or not.
    pub detected: bool,
}

/// State changes the engine asks its owner to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Hopper settled full.
    FilledUp { since_ms: u64, at_ms: u64 },
    /// Hopper settled empty.
    Runout { since_ms: u64, at_ms: u64 },
    /// Not printing: drive the feeder to the safe (off) state.
    ForceOff,
}

impl Transition {
    /// `(since_ms, at_ms)` of a settled level; `None` for [`Self::ForceOff`].
    pub const fn window(self) -> Option<(u64, u64)> {
        match self {
            Self::FilledUp { since_ms, at_ms } | Self::Runout { since_ms, at_ms } => {
                Some((since_ms, at_ms))
            }
            Self::ForceOff => None,
        }
    }
}

/// Point-in-time view exposed to status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorStatus {
    pub filament_detected: bool,
    pub enabled: bool,
}

pub struct DebounceEngine {
    interval_ms: u64,
    state: DebounceState,
    was_printing: bool,
}

impl DebounceEngine {
    /// Start empty, enabled, with the change timer running from `now_ms`.
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            state: DebounceState {
                raw_value: false,
                last_raw_value: None,
                last_change_ms: now_ms,
                action_taken: false,
                enabled: true,
                detected: false,
            },
            was_printing: false,
        }
    }

    /// Record a raw observation.
    ///
    /// While printing the level is latched for the next tick and `None`
    /// is returned.  Otherwise nothing is latched; if the feeder may be
    /// running the corrective transition is returned.
    pub fn observe(&mut self, raw: bool, printing: bool, feeder_on: bool) -> Option<Transition> {
        self.state.detected = raw;

        if !printing {
            if feeder_on || !self.state.raw_value {
                return Some(self.force_off());
            }
            return None;
        }

        self.state.raw_value = raw;
        None
    }

    /// Advance the engine to `now_ms`.
    ///
    /// A clock that stands still or steps backwards never produces a
    /// transition on its own: elapsed time saturates at zero.
    pub fn tick(&mut self, now_ms: u64, printing: bool, feeder_on: bool) -> Option<Transition> {
        if printing && !self.was_printing {
            self.state.raw_value = self.state.detected;
        }
        self.was_printing = printing;

        let s = &mut self.state;
        if s.last_raw_value != Some(s.raw_value) {
            s.last_change_ms = now_ms;
            s.action_taken = false;
        }

        let elapsed = now_ms.saturating_sub(s.last_change_ms);
        let mut transition = None;

        if !printing {
            if feeder_on {
                s.action_taken = false;
                transition = Some(Transition::ForceOff);
            }
        } else if s.enabled && !s.action_taken && elapsed >= self.interval_ms {
            let since_ms = s.last_change_ms;
            transition = Some(if s.raw_value {
                Transition::FilledUp { since_ms, at_ms: now_ms }
            } else {
                Transition::Runout { since_ms, at_ms: now_ms }
            });
            s.action_taken = true;
        }

        s.last_raw_value = Some(s.raw_value);
        transition
    }

    /// Takes effect on the next tick.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    pub fn current_state(&self) -> SensorStatus {
        SensorStatus {
            filament_detected: self.state.detected,
            enabled: self.state.enabled,
        }
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }


    // Re-arm so the settled level is acted on again once printing resumes.
    fn force_off(&mut self) -> Transition {
        self.state.action_taken = false;
        Transition::ForceOff
    }
}
