//! Device-scoped cart and wishlist snapshots.
//!
//! While the shopper is anonymous there is no authoritative remote copy, so
//! the cart and wishlist live in a key/value store on the device. Two fixed
//! keys hold the JSON-serialized collections.
//!
//! [`GuestSnapshot`] is the adapter the orchestrator uses; [`SnapshotStore`]
//! is the storage seam with [`FileSnapshotStore`] and [`MemorySnapshotStore`]
//! implementations.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use basket_core::{CartLine, WishlistEntry};

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::error::report_background_error;
use crate::state::AppState;

/// Key holding the serialized cart.
pub const CART_KEY: &str = "basket.cart";

/// Key holding the serialized wishlist.
pub const WISHLIST_KEY: &str = "basket.wishlist";

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the underlying storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored text is not a valid snapshot.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A lock guarding in-memory storage was poisoned.
    #[error("Snapshot store lock poisoned")]
    Poisoned,
}

/// Key/value text storage scoped to this device.
pub trait SnapshotStore: Send + Sync {
    /// Read the text stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, SnapshotError>;

    /// Store `text` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn write(&self, key: &str, text: &str) -> Result<(), SnapshotError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn delete(&self, key: &str) -> Result<(), SnapshotError>;
}

/// Collections restored from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestData {
    pub cart: Vec<CartLine>,
    pub wishlist: Vec<WishlistEntry>,
}

/// Reads and writes the guest cart and wishlist.
#[derive(Clone)]
pub struct GuestSnapshot {
    store: Arc<dyn SnapshotStore>,
}

impl GuestSnapshot {
    /// Wrap a snapshot store.
    #[must_use]
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Load both collections.
    ///
    /// An unreadable or corrupt collection is reported and treated as empty;
    /// a guest is never blocked by a bad snapshot.
    #[must_use]
    pub fn load(&self) -> GuestData {
        let cart = self.read_cart().unwrap_or_else(|e| {
            report_background_error("reading cart snapshot", &e);
            Vec::new()
        });
        let wishlist = self.read_wishlist().unwrap_or_else(|e| {
            report_background_error("reading wishlist snapshot", &e);
            Vec::new()
        });
        GuestData { cart, wishlist }
    }

    /// Read the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the text does not parse.
    pub fn read_cart(&self) -> Result<Vec<CartLine>, SnapshotError> {
        self.read_collection(CART_KEY)
    }

    /// Read the stored wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the text does not parse.
    pub fn read_wishlist(&self) -> Result<Vec<WishlistEntry>, SnapshotError> {
        self.read_collection(WISHLIST_KEY)
    }

    /// Write both collections of `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    #[instrument(skip(self, state), fields(cart_lines = state.cart().len(), wishlist_entries = state.wishlist().len()))]
    pub fn save(&self, state: &AppState) -> Result<(), SnapshotError> {
        self.store
            .write(CART_KEY, &serde_json::to_string(state.cart())?)?;
        self.store
            .write(WISHLIST_KEY, &serde_json::to_string(state.wishlist())?)?;
        debug!("Guest snapshot saved");
        Ok(())
    }

    /// Remove the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn clear_cart(&self) -> Result<(), SnapshotError> {
        self.store.delete(CART_KEY)
    }

    fn read_collection<T>(&self, key: &str) -> Result<Vec<T>, SnapshotError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.store.read(key)? {
            Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeZone, Utc};

    use basket_core::{
        CartLineDraft, CartLineId, CurrencyCode, Price, ProductId, WishlistDraft, WishlistEntryId,
    };

    use super::*;

    fn sample_state() -> AppState {
        let mut draft = CartLineDraft {
            product_id: ProductId::new("tee"),
            name: "Pineapple Tee".to_string(),
            price: Price::from_cents(2499, CurrencyCode::USD),
            image: Some("https://cdn.example.com/tee.png".to_string()),
            slug: "pineapple-tee".to_string(),
            color: Some("yellow".to_string()),
            size: Some("L".to_string()),
            quantity: 2,
            stock: 8,
            max_quantity: 5,
        };
        let local = draft.clone().into_line(CartLineId::mint());
        draft.size = None;
        let remote = draft.into_line(CartLineId::remote("gid://cart/Line/1"));

        let entry = WishlistDraft {
            product_id: ProductId::new("hat"),
            name: "Sun Hat".to_string(),
            price: Price::from_cents(1500, CurrencyCode::USD),
            image: None,
            slug: "sun-hat".to_string(),
            stock: 2,
        }
        .into_entry(
            WishlistEntryId::mint(),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );

        AppState::from_parts(vec![local, remote], vec![entry], false, false)
    }

    #[test]
    fn test_snapshot_round_trip_preserves_collections() {
        let snapshot = GuestSnapshot::new(Arc::new(MemorySnapshotStore::new()));
        let state = sample_state();

        snapshot.save(&state).unwrap();
        let loaded = snapshot.load();

        assert_eq!(loaded.cart, state.cart());
        assert_eq!(loaded.wishlist, state.wishlist());
        assert!(loaded.cart[0].id.is_local());
        assert!(!loaded.cart[1].id.is_local());
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let snapshot = GuestSnapshot::new(Arc::new(MemorySnapshotStore::new()));
        assert_eq!(snapshot.load(), GuestData::default());
    }

    #[test]
    fn test_corrupt_collection_loads_as_empty_without_touching_the_other() {
        let store = Arc::new(MemorySnapshotStore::new());
        let snapshot = GuestSnapshot::new(store.clone());
        snapshot.save(&sample_state()).unwrap();
        store.write(CART_KEY, "{not json").unwrap();

        assert!(matches!(snapshot.read_cart(), Err(SnapshotError::Parse(_))));

        let loaded = snapshot.load();
        assert!(loaded.cart.is_empty());
        assert_eq!(loaded.wishlist.len(), 1);
    }

    #[test]
    fn test_clear_cart_keeps_wishlist() {
        let store = Arc::new(MemorySnapshotStore::new());
        let snapshot = GuestSnapshot::new(store.clone());
        snapshot.save(&sample_state()).unwrap();

        snapshot.clear_cart().unwrap();

        assert_eq!(store.read(CART_KEY).unwrap(), None);
        assert_eq!(snapshot.read_wishlist().unwrap().len(), 1);
    }
}
