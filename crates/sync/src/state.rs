//! Cart and wishlist state observed by collaborators.

use serde::Serialize;

use basket_core::{CartLine, CartLineId, ProductId, WishlistEntry, WishlistEntryId};

/// Snapshot of the shopper's cart and wishlist.
///
/// Counts are derived from the collections every time a state is built, so
/// they cannot drift from what the collections hold. Fields are private; new
/// states are only produced by [`crate::transition::transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    cart: Vec<CartLine>,
    wishlist: Vec<WishlistEntry>,
    cart_count: u64,
    wishlist_count: usize,
    is_loading: bool,
    is_syncing: bool,
}

impl AppState {
    /// Build a state and recompute its counts.
    #[must_use]
    pub fn from_parts(
        cart: Vec<CartLine>,
        wishlist: Vec<WishlistEntry>,
        is_loading: bool,
        is_syncing: bool,
    ) -> Self {
        let cart_count = cart.iter().map(|line| u64::from(line.quantity)).sum();
        let wishlist_count = wishlist.len();
        Self {
            cart,
            wishlist,
            cart_count,
            wishlist_count,
            is_loading,
            is_syncing,
        }
    }

    /// State at mount: empty and loading.
    #[must_use]
    pub fn initial() -> Self {
        Self::from_parts(Vec::new(), Vec::new(), true, false)
    }

    #[must_use]
    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &[WishlistEntry] {
        &self.wishlist
    }

    /// Total units across all cart lines.
    #[must_use]
    pub const fn cart_count(&self) -> u64 {
        self.cart_count
    }

    /// Number of wishlist entries.
    #[must_use]
    pub const fn wishlist_count(&self) -> usize {
        self.wishlist_count
    }

    /// True until the initial source-of-truth load resolves.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True while a remote mutating call is outstanding.
    #[must_use]
    pub const fn is_syncing(&self) -> bool {
        self.is_syncing
    }

    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.cart.iter().find(|line| &line.id == id)
    }

    /// Find the line holding a product variant.
    #[must_use]
    pub fn variant_line(
        &self,
        product_id: &ProductId,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Option<&CartLine> {
        self.cart
            .iter()
            .find(|line| line.is_variant(product_id, color, size))
    }

    #[must_use]
    pub fn wishlist_entry(&self, id: &WishlistEntryId) -> Option<&WishlistEntry> {
        self.wishlist.iter().find(|entry| &entry.id == id)
    }

    #[must_use]
    pub fn has_wishlisted(&self, product_id: &ProductId) -> bool {
        self.wishlist
            .iter()
            .any(|entry| &entry.product_id == product_id)
    }

    /// Whether the cart and wishlist match another state's, ignoring flags.
    #[must_use]
    pub fn same_collections(&self, other: &Self) -> bool {
        self.cart == other.cart && self.wishlist == other.wishlist
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::initial()
    }
}
