//! Feeder relay driver.
//!
//! Dumb actuator: mirrors [`FeederState`] onto an output pin.  The sensor
//! core decides when the feeder runs; this driver only follows.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`, so the device build
//! passes an ESP-IDF `PinDriver` and tests pass an in-memory pin.

use embedded_hal::digital::OutputPin;

use crate::dispatch::FeederState;
use crate::error::{Error, Result};

pub struct FeederRelay<O> {
    pin: O,
    energised: bool,
}

impl<O: OutputPin> FeederRelay<O> {
    /// Drives the pin low before returning.
    pub fn new(mut pin: O) -> Result<Self> {
        pin.set_low()
            .map_err(|_| Error::Hardware("feeder relay write failed"))?;
        Ok(Self {
            pin,
            energised: false,
        })
    }

    /// Follow the feeder state.  Returns `true` if the pin was driven.
    pub fn sync(&mut self, feeder: &FeederState) -> Result<bool> {
        let want = feeder.is_on();
        if want == self.energised {
            return Ok(false);
        }
        self.drive(want)?;
        Ok(true)
    }

    pub fn force_off(&mut self) -> Result<()> {
        self.drive(false)
    }

    pub fn is_energised(&self) -> bool {
        self.energised
    }

    fn drive(&mut self, on: bool) -> Result<()> {
        if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
        .map_err(|_| Error::Hardware("feeder relay write failed"))?;
        self.energised = on;
        log::debug!("Feeder relay {}", if on { "energised" } else { "released" });
        Ok(())
    }
}
