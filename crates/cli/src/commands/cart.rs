//! Cart commands.

use rust_decimal::Decimal;

use basket_core::{CartLineDraft, CartLineId, CurrencyCode, Price, ProductId};
use basket_sync::{CartStore, Result};

/// Product variant described on the command line.
pub struct Variant {
    pub product: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: u32,
    pub max: Option<u32>,
}

/// Build a cart line draft. The slug is derived from the display name.
pub fn draft(variant: Variant) -> CartLineDraft {
    CartLineDraft {
        slug: slugify(&variant.name),
        product_id: ProductId::new(variant.product),
        name: variant.name,
        price: Price::new(variant.price, CurrencyCode::default()),
        image: None,
        color: variant.color,
        size: variant.size,
        quantity: variant.quantity,
        stock: variant.stock,
        max_quantity: variant.max.unwrap_or(variant.stock),
    }
}

/// Set a line's quantity by its printed ID.
///
/// # Errors
///
/// Returns an error if the line is unknown or the store rejects the change.
pub async fn update(store: &CartStore, line: &str, quantity: i64) -> Result<()> {
    store
        .update_cart_quantity(&CartLineId::from(line), quantity)
        .await
}

/// Remove a line by its printed ID.
///
/// # Errors
///
/// Returns an error if the line is unknown or the store rejects the change.
pub async fn remove(store: &CartStore, line: &str) -> Result<()> {
    store.remove_from_cart(&CartLineId::from(line)).await
}

pub(crate) fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
