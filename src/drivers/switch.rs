//! Hopper level switch driver.
//!
//! ## Hardware
//!
//! Microswitch or optical gate at the hopper's fill line, read as a plain
//! GPIO input.  The level is "pellets present" when high, unless the
//! switch is wired active-low (`invert_switch`).
//!
//! The driver does no debouncing of its own.  It reports level *changes*
//! only, so the sensor's observation log and the debounce window see one
//! sample per edge rather than one per poll.

use embedded_hal::digital::InputPin;

use crate::error::{Error, Result};

pub struct HopperSwitch<P> {
    pin: P,
    invert: bool,
    last: Option<bool>,
}

impl<P: InputPin> HopperSwitch<P> {
    pub fn new(pin: P, invert: bool) -> Self {
        Self {
            pin,
            invert,
            last: None,
        }
    }

    /// Current logical level (pellets present).
    pub fn read(&mut self) -> Result<bool> {
        let high = self
            .pin
            .is_high()
            .map_err(|_| Error::Hardware("hopper switch read failed"))?;
        Ok(high != self.invert)
    }

    /// `Some(level)` on the first poll and whenever the level changed.
    pub fn poll(&mut self) -> Result<Option<bool>> {
        let level = self.read()?;
        if self.last == Some(level) {
            return Ok(None);
        }
        self.last = Some(level);
        Ok(Some(level))
    }
}
