//! Wire types for the cart service's JSON API and their conversions.
//!
//! IDs arrive as plain strings and are always tagged [`basket_core::Origin::Remote`]
//! on conversion, whatever their text looks like.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use basket_core::{
    CartLine, CartLineId, Price, ProductId, WishlistEntry, WishlistEntryId,
};

/// A cart line as the service returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartLine {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub stock: u32,
    /// Falls back to `stock` when the service omits it.
    #[serde(default)]
    pub max_quantity: Option<u32>,
}

impl From<RemoteCartLine> for CartLine {
    fn from(line: RemoteCartLine) -> Self {
        Self {
            id: CartLineId::remote(line.id),
            product_id: ProductId::new(line.product_id),
            name: line.name,
            price: line.price,
            image: line.image,
            slug: line.slug,
            color: line.color,
            size: line.size,
            quantity: line.quantity,
            stock: line.stock,
            max_quantity: line.max_quantity.unwrap_or(line.stock),
        }
    }
}

/// A wishlist entry as the service returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWishlistEntry {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub stock: u32,
    pub added_at: DateTime<Utc>,
}

impl From<RemoteWishlistEntry> for WishlistEntry {
    fn from(entry: RemoteWishlistEntry) -> Self {
        Self {
            id: WishlistEntryId::remote(entry.id),
            product_id: ProductId::new(entry.product_id),
            name: entry.name,
            price: entry.price,
            image: entry.image,
            slug: entry.slug,
            stock: entry.stock,
            added_at: entry.added_at,
        }
    }
}

/// Request body for changing a line's quantity.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateQuantity {
    pub quantity: u32,
}

/// Request body for saving a product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateEntry<'a> {
    pub product_id: &'a ProductId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_line_conversion_tags_remote_origin() {
        let json = r#"{
            "id": "local:looks-local",
            "productId": "tee",
            "name": "Pineapple Tee",
            "price": {"amount": "24.99", "currencyCode": "USD"},
            "quantity": 2,
            "stock": 7
        }"#;
        let remote: RemoteCartLine = serde_json::from_str(json).unwrap();
        let line = CartLine::from(remote);

        assert!(!line.id.is_local());
        assert_eq!(line.id.value(), "local:looks-local");
        assert_eq!(line.max_quantity, 7);
        assert_eq!(line.price.to_string(), "$24.99");
    }

    #[test]
    fn test_remote_wishlist_conversion() {
        let json = r#"{
            "id": "w1",
            "productId": "hat",
            "name": "Sun Hat",
            "price": {"amount": "15.00", "currencyCode": "USD"},
            "addedAt": "2026-03-01T12:00:00Z"
        }"#;
        let entry = WishlistEntry::from(serde_json::from_str::<RemoteWishlistEntry>(json).unwrap());
        assert_eq!(entry.id, WishlistEntryId::remote("w1"));
        assert_eq!(entry.product_id, ProductId::new("hat"));
    }
}
