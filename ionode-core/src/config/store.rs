//! Key/value config store contract and in-memory implementation
//!
//! Values are addressed by a dotted path plus up to two numeric indices
//! (for pin settings: backend id and pin number). Writes are staged and
//! only become the committed state on [`ConfigStore::flush`].

use heapless::{FnvIndexMap, String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest accepted key path
pub const MAX_PATH_LEN: usize = 24;

/// Longest accepted string value
pub const MAX_TEXT_LEN: usize = 16;

/// Store address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key<'a> {
    pub path: &'a str,
    pub index1: Option<u8>,
    pub index2: Option<u8>,
}

impl<'a> Key<'a> {
    pub const fn new(path: &'a str) -> Self {
        Self {
            path,
            index1: None,
            index2: None,
        }
    }

    pub const fn indexed(path: &'a str, index1: u8, index2: u8) -> Self {
        Self {
            path,
            index1: Some(index1),
            index2: Some(index2),
        }
    }
}

/// Store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No room for another entry
    Full,
    /// Path longer than [`MAX_PATH_LEN`]
    KeyTooLong,
    /// String value longer than [`MAX_TEXT_LEN`]
    ValueTooLong,
    /// Backing storage rejected the write
    Io,
}

/// Configuration collaborator
pub trait ConfigStore {
    fn get_int(&self, key: &Key<'_>) -> Option<i32>;

    fn get_string(&self, key: &Key<'_>) -> Option<&str>;

    fn set_int(&mut self, key: &Key<'_>, value: i32) -> Result<(), StoreError>;

    fn set_string(&mut self, key: &Key<'_>, value: &str) -> Result<(), StoreError>;

    /// Remove entries, returning how many were removed
    ///
    /// With `wildcard`, `key.path` matches as a prefix and an absent index
    /// matches any index.
    fn delete(&mut self, key: &Key<'_>, wildcard: bool) -> usize;

    /// Make staged writes the committed state
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Drop staged writes
    fn discard(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoredKey {
    path: String<MAX_PATH_LEN>,
    index1: Option<u8>,
    index2: Option<u8>,
}

impl StoredKey {
    fn from_key(key: &Key<'_>) -> Result<Self, StoreError> {
        let mut path = String::new();
        path.push_str(key.path).map_err(|_| StoreError::KeyTooLong)?;
        Ok(Self {
            path,
            index1: key.index1,
            index2: key.index2,
        })
    }

    fn matches(&self, key: &Key<'_>) -> bool {
        let index_matches =
            |stored: Option<u8>, wanted: Option<u8>| wanted.is_none() || stored == wanted;
        self.path.starts_with(key.path)
            && index_matches(self.index1, key.index1)
            && index_matches(self.index2, key.index2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StoredValue {
    Int(i32),
    Text(String<MAX_TEXT_LEN>),
}

type Entries<const N: usize> = FnvIndexMap<StoredKey, StoredValue, N>;

/// In-memory store with staged and committed halves
///
/// `N` must be a power of two. The firmware persists the committed half
/// whenever [`MemoryStore::take_dirty`] reports a flush, then calls
/// [`MemoryStore::persisted`] or [`MemoryStore::revert`].
pub struct MemoryStore<const N: usize> {
    committed: Entries<N>,
    staged: Option<Entries<N>>,
    /// Committed entries as of the last persisted state
    previous: Option<Entries<N>>,
    dirty: bool,
}

/// Durable home of a [`MemoryStore`]'s committed entries
pub trait StorePersistence<const N: usize> {
    type Error;

    fn save(
        &mut self,
        store: &MemoryStore<N>,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryStore<N> {
    pub fn new() -> Self {
        Self {
            committed: FnvIndexMap::new(),
            staged: None,
            previous: None,
            dirty: false,
        }
    }

    /// Number of visible entries
    pub fn len(&self) -> usize {
        self.visible().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible().is_empty()
    }

    /// Returns true once per flush that has not been persisted yet
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// The committed entries reached durable storage
    pub fn persisted(&mut self) {
        self.previous = None;
    }

    /// Roll the committed entries back to the last persisted state
    pub fn revert(&mut self) {
        self.staged = None;
        self.dirty = false;
        if let Some(previous) = self.previous.take() {
            self.committed = previous;
        }
    }

    fn visible(&self) -> &Entries<N> {
        self.staged.as_ref().unwrap_or(&self.committed)
    }

    fn staging(&mut self) -> &mut Entries<N> {
        let committed = &self.committed;
        self.staged.get_or_insert_with(|| committed.clone())
    }

    fn get(&self, key: &Key<'_>) -> Option<&StoredValue> {
        let key = StoredKey::from_key(key).ok()?;
        self.visible().get(&key)
    }

    fn set(&mut self, key: &Key<'_>, value: StoredValue) -> Result<(), StoreError> {
        let key = StoredKey::from_key(key)?;
        self.staging()
            .insert(key, value)
            .map(|_| ())
            .map_err(|_| StoreError::Full)
    }
}

#[cfg(feature = "serde")]
impl<const N: usize> MemoryStore<N> {
    /// Encode the committed entries
    pub fn to_bytes<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], postcard::Error> {
        postcard::to_slice(&self.committed, buf)
    }

    /// Rebuild a store from encoded committed entries
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        Ok(Self {
            committed: postcard::from_bytes(bytes)?,
            staged: None,
            previous: None,
            dirty: false,
        })
    }
}

impl<const N: usize> ConfigStore for MemoryStore<N> {
    fn get_int(&self, key: &Key<'_>) -> Option<i32> {
        match self.get(key)? {
            StoredValue::Int(value) => Some(*value),
            StoredValue::Text(_) => None,
        }
    }

    fn get_string(&self, key: &Key<'_>) -> Option<&str> {
        match self.get(key)? {
            StoredValue::Text(text) => Some(text.as_str()),
            StoredValue::Int(_) => None,
        }
    }

    fn set_int(&mut self, key: &Key<'_>, value: i32) -> Result<(), StoreError> {
        self.set(key, StoredValue::Int(value))
    }

    fn set_string(&mut self, key: &Key<'_>, value: &str) -> Result<(), StoreError> {
        let mut text = String::new();
        text.push_str(value).map_err(|_| StoreError::ValueTooLong)?;
        self.set(key, StoredValue::Text(text))
    }

    fn delete(&mut self, key: &Key<'_>, wildcard: bool) -> usize {
        let doomed: Vec<StoredKey, N> = match wildcard {
            true => self
                .visible()
                .keys()
                .filter(|stored| stored.matches(key))
                .cloned()
                .collect(),
            false => match StoredKey::from_key(key) {
                Ok(exact) if self.visible().contains_key(&exact) => {
                    let mut one = Vec::new();
                    let _ = one.push(exact);
                    one
                }
                _ => Vec::new(),
            },
        };

        if doomed.is_empty() {
            return 0;
        }
        let entries = self.staging();
        for stored in &doomed {
            entries.remove(stored);
        }
        doomed.len()
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if let Some(staged) = self.staged.take() {
            let replaced = core::mem::replace(&mut self.committed, staged);
            self.previous.get_or_insert(replaced);
            self.dirty = true;
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.staged = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_writes_visible_until_discard() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let key = Key::indexed("io.mode", 0, 4);

        store.set_int(&key, 3).unwrap();
        assert_eq!(store.get_int(&key), Some(3));

        store.discard();
        assert_eq!(store.get_int(&key), None);
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_flush_commits_and_marks_dirty() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        store
            .set_string(&Key::indexed("io.bus.role", 0, 4), "scl")
            .unwrap();
        store.flush().unwrap();
        store.discard();

        assert_eq!(
            store.get_string(&Key::indexed("io.bus.role", 0, 4)),
            Some("scl")
        );
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_revert_restores_last_persisted_entries() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let key = Key::new("pwm.period");
        store.set_int(&key, 2000).unwrap();
        store.flush().unwrap();
        assert!(store.take_dirty());
        store.persisted();

        store.set_int(&key, 4000).unwrap();
        store.flush().unwrap();
        store.set_int(&key, 5000).unwrap();
        store.flush().unwrap();
        assert!(store.take_dirty());
        store.revert();

        assert_eq!(store.get_int(&key), Some(2000));
        assert!(!store.take_dirty());

        // nothing left to roll back to
        store.revert();
        assert_eq!(store.get_int(&key), Some(2000));
    }

    #[test]
    fn test_wildcard_delete_is_scoped_to_pin() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        store.set_int(&Key::indexed("io.mode", 0, 4), 2).unwrap();
        store
            .set_int(&Key::indexed("io.counter.debounce", 0, 4), 50)
            .unwrap();
        store.set_int(&Key::indexed("io.mode", 0, 5), 3).unwrap();
        store.set_int(&Key::new("pwm.period"), 2000).unwrap();

        assert_eq!(store.delete(&Key::indexed("io.", 0, 4), true), 2);
        assert_eq!(store.get_int(&Key::indexed("io.mode", 0, 4)), None);
        assert_eq!(store.get_int(&Key::indexed("io.mode", 0, 5)), Some(3));
        assert_eq!(store.get_int(&Key::new("pwm.period")), Some(2000));
    }

    #[test]
    fn test_type_mismatch_reads_none() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let key = Key::new("trigger.status.io");
        store.set_int(&key, 1).unwrap();
        assert_eq!(store.get_string(&key), None);
    }

    #[test]
    fn test_rejects_oversized_keys_and_values() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        assert_eq!(
            store.set_int(&Key::new("a.path.that.is.far.too.long.for.keys"), 1),
            Err(StoreError::KeyTooLong)
        );
        assert_eq!(
            store.set_string(&Key::new("x"), "a string value that overflows"),
            Err(StoreError::ValueTooLong)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_committed_entries_survive_encoding() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        store.set_int(&Key::indexed("io.mode", 1, 2), 3).unwrap();
        store.flush().unwrap();

        let mut buf = [0u8; 256];
        let bytes = store.to_bytes(&mut buf).unwrap();
        let restored: MemoryStore<16> = MemoryStore::from_bytes(bytes).unwrap();
        assert_eq!(restored.get_int(&Key::indexed("io.mode", 1, 2)), Some(3));
    }
}
