//! Wishlist entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, WishlistEntryId};
use super::price::Price;

/// One saved-for-later product.
///
/// A wishlist holds at most one entry per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub slug: String,
    /// Stock on hand when the entry was saved.
    pub stock: u32,
    pub added_at: DateTime<Utc>,
}

/// Catalog snapshot supplied by a collaborator when saving a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistDraft {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub slug: String,
    pub stock: u32,
}

impl WishlistDraft {
    /// Turn the draft into an entry with the given identity and timestamp.
    #[must_use]
    pub fn into_entry(self, id: WishlistEntryId, added_at: DateTime<Utc>) -> WishlistEntry {
        WishlistEntry {
            id,
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            image: self.image,
            slug: self.slug,
            stock: self.stock,
            added_at,
        }
    }
}
