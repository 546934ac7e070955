//! ionode Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that chip-specific
//! HALs implement so the pin-mode core can run unchanged on different
//! silicon (and on the host, against mocks).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ionode-firmware)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ionode-core (modes, scheduler, dump)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ionode-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ ionode-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PinPort`] - Register-level access to on-chip pins
//! - [`pwm::PwmGenerator`] - Multi-channel PWM generator
//! - [`adc::AnalogInput`] - Single analog input
//! - [`i2c::I2cBus`] - I2C bus operations (port expanders)
//! - [`flash::FlashStorage`] - Persistent blob storage

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod pwm;

// Re-export key traits at crate root for convenience
pub use adc::{AnalogInput, ANALOG_FULL_SCALE};
pub use flash::{FlashStorage, StorageKey};
pub use gpio::{MuxSelect, PhysicalPin, PinDirection, PinPort};
pub use i2c::I2cBus;
pub use pwm::{PwmChannelSetup, PwmGenerator, DEFAULT_PERIOD_US, MAX_DUTY};
