//! In-process snapshot store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{SnapshotError, SnapshotStore};

/// Snapshot store backed by a map in memory.
///
/// Useful for embedding the store where no device storage exists, and in
/// tests.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, SnapshotError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| SnapshotError::Poisoned)?
            .is_empty())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| SnapshotError::Poisoned)?
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, text: &str) -> Result<(), SnapshotError> {
        self.entries
            .write()
            .map_err(|_| SnapshotError::Poisoned)?
            .insert(key.to_string(), text.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SnapshotError> {
        self.entries
            .write()
            .map_err(|_| SnapshotError::Poisoned)?
            .remove(key);
        Ok(())
    }
}
