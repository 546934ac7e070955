//! Board-agnostic pin-mode core for the ionode I/O node firmware
//!
//! This crate contains everything that does not touch registers directly:
//!
//! - Pin registry and per-pin slot arena
//! - Persisted pin configuration schema and the config-store contract
//! - Mode traits (per-mode initialization)
//! - Edge counter mailbox and debounce handling
//! - PWM ramp engine and analog sampler
//! - Native and port-expander backends behind one dispatch contract
//! - Periodic scheduler, dump rendering and operator commands
//!
//! Hardware access goes through the `ionode-hal` traits, so the whole
//! crate runs on the host against the doubles in `mock`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod analog;
pub mod backend;
pub mod command;
pub mod config;
pub mod dump;
pub mod edge;
pub mod error;
pub mod io;
pub mod modes;
pub mod ramp;
pub mod registry;
pub mod runtime;

#[cfg(test)]
mod mock;

pub use backend::{BackendId, IoBackend, TriggerAction};
pub use config::{ConfigStore, PinConfig, PinMode};
pub use edge::EdgeMailbox;
pub use error::IoError;
pub use io::{Io, PinAddress, TICK_MS};
pub use registry::{PinId, PinRegistry};
