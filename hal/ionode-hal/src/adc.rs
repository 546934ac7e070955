//! Analog input abstraction

/// Largest raw value an analog input reports (10-bit converter)
pub const ANALOG_FULL_SCALE: u16 = 1023;

/// Single-channel analog input
///
/// Implementations on wider converters scale down to 10 bits so that the
/// averaging and clamping constants in the core hold on every chip.
pub trait AnalogInput {
    /// Take one raw sample (0..=ANALOG_FULL_SCALE)
    ///
    /// Must not block; a failed conversion reports 0.
    fn read_raw(&mut self) -> u16;
}
