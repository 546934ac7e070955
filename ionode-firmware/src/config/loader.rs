//! Configuration persistence
//!
//! Loads the key/value store from flash and writes it back after every
//! flush. Falls back to an empty store (all pins disabled) when flash holds
//! nothing usable.

use defmt::*;

use ionode_core::config::{MemoryStore, StorePersistence};
use ionode_hal_rp2040::flash::{FlashError, StorageKey};
use ionode_hal_rp2040::{ConfigFlash, FlashStorageTrait};

/// Store capacity (power of two)
pub const STORE_ENTRIES: usize = 128;

/// Maximum serialized store size
const MAX_STORE_SIZE: usize = 4096;

pub type NodeStore = MemoryStore<STORE_ENTRIES>;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

pub struct ConfigPersistence<'d> {
    storage: ConfigFlash<'d>,
    buffer: [u8; MAX_STORE_SIZE],
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: ConfigFlash<'d>) -> Self {
        Self {
            storage,
            buffer: [0; MAX_STORE_SIZE],
        }
    }

    /// Load the store, or an empty one
    pub async fn load_or_default(&mut self) -> NodeStore {
        match self.load().await {
            Ok(store) => {
                info!("Loaded {} config entries from flash", store.len());
                store
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No stored configuration, all pins disabled");
                NodeStore::new()
            }
            Err(e) => {
                warn!("Stored configuration unusable: {:?}", e);
                NodeStore::new()
            }
        }
    }

    async fn load(&mut self) -> Result<NodeStore, ConfigError> {
        let len = self
            .storage
            .read(StorageKey::ConfigStore, &mut self.buffer)
            .await?;
        debug!("Read {} bytes of config from flash", len);

        NodeStore::from_bytes(&self.buffer[..len]).map_err(|_| ConfigError::Deserialize)
    }
}

impl StorePersistence<STORE_ENTRIES> for ConfigPersistence<'_> {
    type Error = ConfigError;

    /// Write the committed entries of the store
    async fn save(&mut self, store: &NodeStore) -> Result<(), ConfigError> {
        let bytes = store
            .to_bytes(&mut self.buffer)
            .map_err(|_| ConfigError::Serialize)?;
        let len = bytes.len();
        if let Err(e) = self.storage.write(StorageKey::ConfigStore, bytes).await {
            warn!("Writing {} bytes of config failed: {:?}", len, e);
            return Err(e.into());
        }
        debug!("Wrote {} bytes of config to flash", len);
        Ok(())
    }
}
