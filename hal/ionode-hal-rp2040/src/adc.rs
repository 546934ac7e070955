//! Analog input on one ADC channel
//!
//! RP2040 has a single 12-bit ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor
//!
//! Readings are scaled down to the 10-bit range the core expects.

use embassy_rp::adc::{Adc, Blocking, Channel};
use ionode_hal::{AnalogInput, ANALOG_FULL_SCALE};

/// Bits dropped to go from 12 to 10 bits
const SCALE_SHIFT: u32 = 2;

pub struct Rp2040Analog<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> Rp2040Analog<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl AnalogInput for Rp2040Analog<'_> {
    fn read_raw(&mut self) -> u16 {
        match self.adc.blocking_read(&mut self.channel) {
            Ok(raw) => (raw >> SCALE_SHIFT).min(ANALOG_FULL_SCALE),
            Err(_) => 0,
        }
    }
}
