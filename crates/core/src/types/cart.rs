//! Cart line types.

use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::price::Price;

/// One purchasable (product, variant) grouping in the cart.
///
/// `quantity` is always between 1 and `max_quantity`; the transition function
/// clamps additions and drops lines updated to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Line identity, tagged with its origin.
    pub id: CartLineId,
    /// Catalog product reference.
    pub product_id: ProductId,
    /// Product name at the time the line was created.
    pub name: String,
    /// Unit price at the time the line was created.
    pub price: Price,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Product URL slug.
    pub slug: String,
    /// Selected color variant.
    #[serde(default)]
    pub color: Option<String>,
    /// Selected size variant.
    #[serde(default)]
    pub size: Option<String>,
    /// Units in the cart.
    pub quantity: u32,
    /// Stock on hand when the line was created.
    pub stock: u32,
    /// Upper bound for `quantity`.
    pub max_quantity: u32,
}

impl CartLine {
    /// Whether this line holds the given product variant.
    ///
    /// Two additions land on the same line iff product, color and size match.
    #[must_use]
    pub fn is_variant(&self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        &self.product_id == product_id
            && self.color.as_deref() == color
            && self.size.as_deref() == size
    }

    /// Total price of this line.
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Catalog snapshot supplied by a collaborator when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDraft {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    pub stock: u32,
    pub max_quantity: u32,
}

impl CartLineDraft {
    /// Turn the draft into a line with the given identity.
    #[must_use]
    pub fn into_line(self, id: CartLineId) -> CartLine {
        CartLine {
            id,
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            image: self.image,
            slug: self.slug,
            color: self.color,
            size: self.size,
            quantity: self.quantity,
            stock: self.stock,
            max_quantity: self.max_quantity,
        }
    }
}

impl From<&CartLine> for CartLineDraft {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.price,
            image: line.image.clone(),
            slug: line.slug.clone(),
            color: line.color.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
            stock: line.stock,
            max_quantity: line.max_quantity,
        }
    }
}
