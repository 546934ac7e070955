//! PWM generator abstraction
//!
//! A single generator drives a small, fixed number of channels. Channels
//! are bound to pins once at boot; duty changes are buffered and take
//! effect on [`PwmGenerator::start`].

use crate::gpio::PhysicalPin;

/// Largest representable duty value
pub const MAX_DUTY: u16 = u16::MAX;

/// Default PWM period in microseconds (~333 Hz)
pub const DEFAULT_PERIOD_US: u32 = 3000;

/// Initial binding of a channel to a pin
#[derive(Debug, Clone, Copy)]
pub struct PwmChannelSetup<'a> {
    /// Pin routed to this channel
    pub pin: &'a PhysicalPin,
    /// Duty applied when the generator first starts
    pub duty: u16,
}

/// Multi-channel PWM generator
pub trait PwmGenerator {
    /// Number of channels the hardware can drive
    fn channel_budget(&self) -> u8;

    /// Bind channels to pins, in channel order, and start the generator
    ///
    /// Called once at boot with at most `channel_budget()` entries.
    fn init(&mut self, period_us: u32, channels: &[PwmChannelSetup<'_>]);

    /// Duty currently programmed for a channel (0..=MAX_DUTY)
    fn duty(&self, channel: u8) -> u16;

    /// Buffer a new duty for a channel
    fn set_duty(&mut self, channel: u8, duty: u16);

    /// Apply buffered duties and restart the generator
    fn start(&mut self);

    /// Current period in microseconds
    fn period_us(&self) -> u32;

    /// Change the period; takes effect on the next `start`
    fn set_period_us(&mut self, period_us: u32);

    /// Current output frequency in Hz
    fn frequency_hz(&self) -> u32 {
        match self.period_us() {
            0 => 0,
            period => 1_000_000 / period,
        }
    }
}
