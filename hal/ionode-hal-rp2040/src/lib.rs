//! RP2040-specific HAL for the ionode I/O node
//!
//! This crate provides RP2040 implementations of the shared `ionode-hal`
//! traits, plus RP2040-specific plumbing:
//!
//! - Register-level pin port over SIO, IO_BANK0 and PADS_BANK0
//! - Edge arming signals shared with the edge-detection tasks
//! - PWM slices driven as one multi-channel generator
//! - ADC input scaled to 10 bits
//! - Blocking I2C bus for the port expander
//! - Flash storage driver (implements `ionode_hal::FlashStorage`)
//! - Pin bank for handing GPIO peripherals out by number

#![no_std]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod pins;
pub mod pwm;

pub use adc::Rp2040Analog;
pub use flash::ConfigFlash;
pub use gpio::{EdgeArm, Rp2040Port, GPIO_COUNT};
pub use i2c::BlockingI2c;
pub use pins::PinBank;
pub use pwm::Rp2040Pwm;

// Re-export shared traits from ionode-hal for convenience
pub use ionode_hal::{FlashStorage as FlashStorageTrait, StorageKey};
