//! Operating-mode gate.
//!
//! Answers one question: may the feeder be actuated right now?  Only a
//! positive "printing" answer from the print-state tracker opens the
//! gate.  An unavailable tracker keeps it closed so the corrective
//! force-off path engages instead of leaving the feeder unmanaged.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::app::ports::{OperatingMode, PrintStateProvider};

pub struct OperatingModeGate<P> {
    provider: P,
    /// Latched so an absent tracker is reported once, not every tick.
    unavailable: AtomicBool,
}

impl<P: PrintStateProvider> OperatingModeGate<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Fails closed: any error reads as "not printing".
    pub fn is_printing(&self, now_ms: u64) -> bool {
        match self.provider.current_mode(now_ms) {
            Ok(mode) => {
                if self.unavailable.swap(false, Ordering::Relaxed) {
                    info!("Print state available again ({:?})", mode);
                }
                mode == OperatingMode::Printing
            }
            Err(e) => {
                if !self.unavailable.swap(true, Ordering::Relaxed) {
                    warn!("Gate closed: {}", e);
                }
                false
            }
        }
    }
}
