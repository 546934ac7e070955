//! Pin configuration
//!
//! - [`mode`]: pin modes, per-mode records, flags
//! - [`store`]: key/value store contract and the in-memory store
//! - [`schema`]: how records map onto store keys

pub mod mode;
pub mod schema;
pub mod store;

pub use mode::{
    BusConfig, BusRole, CounterConfig, InputConfig, OutputConfig, PinConfig, PinFlag, PinMode,
    PwmConfig, TimerConfig, TimerDirection,
};
pub use schema::Indicator;
pub use store::{ConfigStore, Key, MemoryStore, StoreError, StorePersistence};
