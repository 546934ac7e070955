//! Runtime pin ownership
//!
//! Which pins need an edge task is only known once the stored pin modes
//! are loaded, so the firmware parks the board's pins here and takes them
//! by number afterwards.

use embassy_rp::gpio::AnyPin;
use embassy_rp::Peri;

use crate::gpio::GPIO_COUNT;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken or never parked
    Unavailable,
}

pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl Default for PinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl PinBank {
    pub fn new() -> Self {
        Self {
            pins: [const { None }; GPIO_COUNT],
        }
    }

    /// Park a pin under its GPIO number
    pub fn insert(&mut self, index: u8, pin: Peri<'static, AnyPin>) -> Result<(), PinError> {
        let slot = self
            .pins
            .get_mut(usize::from(index))
            .ok_or(PinError::InvalidPin)?;
        *slot = Some(pin);
        Ok(())
    }

    /// Take a pin by number
    pub fn take(&mut self, index: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(usize::from(index))
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::Unavailable)
    }
}
