//! Outbound application events.
//!
//! The [`Evaluator`](super::service::Evaluator) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, echo to the printer
//! console, etc.

use crate::dispatch::SensorEvent;
use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The evaluator task started.
    Started,

    /// A settled level was acted on.
    DebounceElapsed {
        event: SensorEvent,
        /// When the level last changed (clock ms).
        since_ms: u64,
        /// When the settled level was detected (clock ms).
        at_ms: u64,
    },

    /// A queued event (corrective force-off or emergency) was dispatched.
    Dispatched(SensorEvent),

    /// The event's script failed; the cycle carries on.
    ScriptFailed {
        event: SensorEvent,
        error: ScriptError,
    },

    /// The evaluator task stopped between ticks.
    Stopped,
}
