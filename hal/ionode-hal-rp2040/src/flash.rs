//! Flash storage driver for RP2040
//!
//! Keeps blobs in a sequential-storage map inside the last 64KB of flash,
//! which spreads wear over the partition.
//!
//! Implements the `FlashStorage` trait from `ionode-hal`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use ionode_hal::flash::{FlashError, StorageKey};

/// Raspberry Pi Pico flash size
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024;
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Largest blob the driver moves in one piece
pub const MAX_BLOB_SIZE: usize = 4096;

const CONFIG_RANGE: core::ops::Range<u32> = (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

pub struct ConfigFlash<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    scratch: [u8; MAX_BLOB_SIZE],
}

impl<'d> ConfigFlash<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            scratch: [0; MAX_BLOB_SIZE],
        }
    }
}

impl ionode_hal::FlashStorage for ConfigFlash<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let item = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
        )
        .await
        .map_err(|_| FlashError::Storage)?
        .ok_or(FlashError::NotFound)?;

        let target = buffer
            .get_mut(..item.len())
            .ok_or(FlashError::BufferTooSmall)?;
        target.copy_from_slice(item);
        Ok(item.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
            &data,
        )
        .await
        .map_err(|_| FlashError::Storage)
    }
}
