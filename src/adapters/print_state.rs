//! Atomic print-mode cache.
//!
//! Whatever knows the job state (a "printing" input from the printer
//! board, a console report) writes it here; the mode gate reads it from
//! any context.  The cache starts out unknown and goes stale if reports
//! stop arriving, and both read as unavailable so the gate fails closed.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::app::ports::{OperatingMode, PrintStateProvider};
use crate::error::{Collaborator, Result};

const MODE_UNKNOWN: u8 = 0;
const MODE_PRINTING: u8 = 1;
const MODE_OTHER: u8 = 2;

pub struct SharedPrintState {
    mode: AtomicU8,
    /// Report time, milliseconds truncated to u32 (wrap-safe arithmetic).
    reported_ms: AtomicU32,
    stale_after_ms: u32,
}

impl SharedPrintState {
    /// `stale_after_ms == 0` disables staleness checks.
    pub const fn new(stale_after_ms: u32) -> Self {
        Self {
            mode: AtomicU8::new(MODE_UNKNOWN),
            reported_ms: AtomicU32::new(0),
            stale_after_ms,
        }
    }

    pub fn report(&self, mode: OperatingMode, now_ms: u64) {
        let raw = match mode {
            OperatingMode::Printing => MODE_PRINTING,
            OperatingMode::Other => MODE_OTHER,
        };
        self.reported_ms.store(now_ms as u32, Ordering::Release);
        self.mode.store(raw, Ordering::Release);
    }
}

impl PrintStateProvider for SharedPrintState {
    fn current_mode(&self, now_ms: u64) -> Result<OperatingMode> {
        let mode = match self.mode.load(Ordering::Acquire) {
            MODE_PRINTING => OperatingMode::Printing,
            MODE_OTHER => OperatingMode::Other,
            _ => return Err(Collaborator::PrintState.into()),
        };

        if self.stale_after_ms > 0 {
            let age = (now_ms as u32).wrapping_sub(self.reported_ms.load(Ordering::Acquire));
            if age > self.stale_after_ms {
                return Err(Collaborator::PrintState.into());
            }
        }
        Ok(mode)
    }
}
