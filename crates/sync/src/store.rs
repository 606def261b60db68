//! [`CartStore`], the single entry point for cart and wishlist operations.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use basket_core::{
    CartLineDraft, CartLineId, IdentityStatus, Phase, WishlistDraft, WishlistEntryId,
};

use crate::error::{Result, add_breadcrumb};
use crate::orchestrator::{MergeReport, Orchestrator};
use crate::persistence::{GuestSnapshot, SnapshotStore};
use crate::remote::RemoteSync;
use crate::state::AppState;

/// Cart and wishlist store shared across the application.
///
/// Cheap to clone; all clones observe and mutate the same state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Orchestrator>,
}

impl CartStore {
    /// Create a store in the initial (loading) state.
    ///
    /// Nothing is loaded until the first identity signal arrives through
    /// [`Self::drive`] or [`Self::handle_identity`].
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotStore>, remote: RemoteSync) -> Self {
        Self {
            inner: Arc::new(Orchestrator::new(GuestSnapshot::new(snapshots), remote)),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AppState {
        self.inner.state()
    }

    /// Receiver notified after every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.subscribe()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Apply one identity signal value.
    pub async fn handle_identity(&self, status: IdentityStatus) -> Option<MergeReport> {
        self.inner.handle_identity(status).await
    }

    /// Follow an identity signal until its sender is dropped.
    ///
    /// The current value is applied first, then every change in order.
    pub async fn drive(&self, mut identity: watch::Receiver<IdentityStatus>) {
        loop {
            let status = identity.borrow_and_update().clone();
            if let Some(report) = self.inner.handle_identity(status).await {
                debug!(?report, "Identity change merged guest cart");
            }
            if identity.changed().await.is_err() {
                info!("Identity signal closed");
                break;
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a product variant to the cart, merging with a matching line.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready or the remote call fails.
    #[instrument(skip(self, draft), fields(product_id = %draft.product_id, quantity = draft.quantity))]
    pub async fn add_to_cart(&self, draft: CartLineDraft) -> Result<()> {
        add_breadcrumb(
            "cart",
            "Add to cart",
            Some(&[("product_id", draft.product_id.as_str())]),
        );
        self.inner
            .add_to_cart(draft)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to add to cart"))
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready, the line is unknown or the
    /// remote call fails.
    #[instrument(skip(self, id), fields(line_id = %id))]
    pub async fn remove_from_cart(&self, id: &CartLineId) -> Result<()> {
        add_breadcrumb(
            "cart",
            "Remove from cart",
            Some(&[("line_id", id.to_string().as_str())]),
        );
        self.inner
            .remove_from_cart(id)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to remove cart line"))
    }

    /// Set a line's quantity. Zero or less removes the line; larger values
    /// are clamped to the line's maximum.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready, the line is unknown or the
    /// remote call fails.
    #[instrument(skip(self, id), fields(line_id = %id))]
    pub async fn update_cart_quantity(&self, id: &CartLineId, quantity: i64) -> Result<()> {
        add_breadcrumb(
            "cart",
            "Update quantity",
            Some(&[
                ("line_id", id.to_string().as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
        self.inner
            .update_cart_quantity(id, quantity)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update cart quantity"))
    }

    /// Remove every cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready or the remote call fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        add_breadcrumb("cart", "Clear cart", None);
        self.inner
            .clear_cart()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to clear cart"))
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Save a product. Already-saved products are left as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready or the remote call fails.
    #[instrument(skip(self, draft), fields(product_id = %draft.product_id))]
    pub async fn add_to_wishlist(&self, draft: WishlistDraft) -> Result<()> {
        add_breadcrumb(
            "wishlist",
            "Add to wishlist",
            Some(&[("product_id", draft.product_id.as_str())]),
        );
        self.inner
            .add_to_wishlist(draft)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to add to wishlist"))
    }

    /// Remove a wishlist entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready, the entry is unknown or
    /// the remote call fails.
    #[instrument(skip(self, id), fields(entry_id = %id))]
    pub async fn remove_from_wishlist(&self, id: &WishlistEntryId) -> Result<()> {
        add_breadcrumb(
            "wishlist",
            "Remove from wishlist",
            Some(&[("entry_id", id.to_string().as_str())]),
        );
        self.inner
            .remove_from_wishlist(id)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to remove wishlist entry"))
    }

    /// Reload both collections from the authoritative source.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not ready or a remote fetch fails.
    /// Whichever collection did load is still applied.
    #[instrument(skip(self))]
    pub async fn resync(&self) -> Result<()> {
        self.inner
            .resync()
            .await
            .inspect_err(|e| warn!(error = %e, "Resync failed"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use basket_core::{CurrencyCode, Identity, Price, ProductId};

    use super::*;
    use crate::StoreError;
    use crate::persistence::{CART_KEY, MemorySnapshotStore};

    fn tee(quantity: u32) -> CartLineDraft {
        CartLineDraft {
            product_id: ProductId::new("tee"),
            name: "Pineapple Tee".to_string(),
            price: Price::from_cents(2499, CurrencyCode::USD),
            image: None,
            slug: "pineapple-tee".to_string(),
            color: Some("yellow".to_string()),
            size: Some("M".to_string()),
            quantity,
            stock: 10,
            max_quantity: 5,
        }
    }

    fn guest_store() -> (CartStore, Arc<MemorySnapshotStore>) {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        let store = CartStore::new(snapshots.clone(), RemoteSync::offline());
        (store, snapshots)
    }

    #[tokio::test]
    async fn test_mutations_rejected_before_identity_resolves() {
        let (store, _) = guest_store();
        assert!(store.state().is_loading());

        let err = store.add_to_cart(tee(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotReady));

        store.handle_identity(IdentityStatus::Resolving).await;
        let err = store.clear_cart().await.unwrap_err();
        assert!(matches!(err, StoreError::NotReady));
    }

    #[tokio::test]
    async fn test_guest_add_persists_snapshot() {
        let (store, snapshots) = guest_store();
        store.handle_identity(IdentityStatus::Anonymous).await;
        assert_eq!(store.phase(), Phase::GuestReady);
        assert!(!store.state().is_loading());

        store.add_to_cart(tee(2)).await.unwrap();

        let state = store.state();
        assert_eq!(state.cart_count(), 2);
        assert!(state.cart()[0].id.is_local());
        let saved = snapshots.read(CART_KEY).unwrap().unwrap();
        assert!(saved.contains("\"quantity\":2"));
    }

    #[tokio::test]
    async fn test_unknown_line_is_reported() {
        let (store, _) = guest_store();
        store.handle_identity(IdentityStatus::Anonymous).await;

        let missing = CartLineId::mint();
        let err = store.remove_from_cart(&missing).await.unwrap_err();
        assert!(matches!(err, StoreError::LineNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_drive_follows_identity_signal() {
        let (store, _) = guest_store();
        let (tx, rx) = watch::channel(IdentityStatus::Anonymous);

        let driver = tokio::spawn({
            let store = store.clone();
            async move { store.drive(rx).await }
        });

        let mut states = store.subscribe();
        states
            .wait_for(|state| !state.is_loading())
            .await
            .unwrap();
        assert_eq!(store.phase(), Phase::GuestReady);

        // No cart service: both fetches fail and the store still settles.
        tx.send(IdentityStatus::Identified(Identity::new("c-1")))
            .unwrap();
        drop(tx);
        driver.await.unwrap();

        assert_eq!(store.phase(), Phase::IdentifiedReady);
        assert!(!store.state().is_loading());
    }
}
