//! Core types for Basket.
//!
//! This module provides type-safe wrappers for cart and wishlist concepts.

pub mod cart;
pub mod id;
pub mod identity;
pub mod price;
pub mod status;
pub mod wishlist;

pub use cart::{CartLine, CartLineDraft};
pub use id::*;
pub use identity::{Identity, IdentityStatus};
pub use price::{CurrencyCode, Price};
pub use status::Phase;
pub use wishlist::{WishlistDraft, WishlistEntry};
