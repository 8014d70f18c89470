//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (ESP-IDF logger on the device, whatever the host
//! installed in tests).

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink {
    name: String,
}

impl LogEventSink {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | sensor={}", self.name),
            AppEvent::DebounceElapsed { event, since_ms, at_ms } => {
                info!(
                    "EVENT | sensor={} | {:?} | settled {} ms ({} -> {})",
                    self.name,
                    event,
                    at_ms.saturating_sub(*since_ms),
                    since_ms,
                    at_ms
                );
            }
            AppEvent::Dispatched(event) => {
                info!("EVENT | sensor={} | {:?} | queued", self.name, event);
            }
            AppEvent::ScriptFailed { event, error } => {
                error!("SCRIPT | sensor={} | {:?} | {}", self.name, event, error);
            }
            AppEvent::Stopped => info!("STOP | sensor={}", self.name),
        }
    }
}
