//! Wishlist commands.

use rust_decimal::Decimal;

use basket_core::{CurrencyCode, Price, ProductId, WishlistDraft, WishlistEntryId};
use basket_sync::{CartStore, Result};

use super::cart::slugify;

/// Build a wishlist draft.
pub fn draft(product: String, name: String, price: Decimal, stock: u32) -> WishlistDraft {
    WishlistDraft {
        product_id: ProductId::new(product),
        slug: slugify(&name),
        name,
        price: Price::new(price, CurrencyCode::default()),
        image: None,
        stock,
    }
}

/// Remove an entry by its printed ID.
///
/// # Errors
///
/// Returns an error if the entry is unknown or the store rejects the change.
pub async fn remove(store: &CartStore, entry: &str) -> Result<()> {
    store.remove_from_wishlist(&WishlistEntryId::from(entry)).await
}
