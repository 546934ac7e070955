//! Persistent blob storage
//!
//! The node keeps its whole configuration store as one encoded blob. Chip
//! HALs put that blob wherever their flash allows and are expected to
//! spread wear and detect torn writes.

/// Blob identifiers
///
/// Encoded as a single byte in front of every stored item, so values must
/// never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Committed configuration store entries
    ConfigStore = 0,
}

impl StorageKey {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ConfigStore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Raw flash access failed
    Flash,
    /// The storage layer rejected the item or found the partition corrupt
    Storage,
    /// Nothing stored under the key
    NotFound,
    /// Stored item does not fit the caller's buffer
    BufferTooSmall,
}

/// Keyed blob storage in flash
pub trait FlashStorage {
    /// Copy the blob stored under `key` into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Replace the blob stored under `key`
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        let slot = buffer
            .first_mut()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        *slot = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let byte = buffer
            .first()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        Self::from_u8(*byte)
            .map(|key| (key, 1))
            .ok_or(sequential_storage::map::SerializationError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_bytes() {
        assert_eq!(StorageKey::from_u8(0), Some(StorageKey::ConfigStore));
        assert_eq!(StorageKey::ConfigStore.as_u8(), 0);
        assert_eq!(StorageKey::from_u8(9), None);
    }
}
