//! Pure state transitions.
//!
//! [`transition`] is the only place cart and wishlist invariants are enforced:
//! - a line's quantity never exceeds its `max_quantity`
//! - a line with quantity zero does not exist
//! - additions of the same `(product, color, size)` land on one line
//! - a wishlist holds at most one entry per product
//!
//! Every transition builds fresh collections and recomputes counts through
//! [`AppState::from_parts`].

use basket_core::{CartLine, CartLineId, WishlistEntry, WishlistEntryId};

use crate::state::AppState;

/// Closed set of state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetLoading(bool),
    SetSyncing(bool),
    /// Replace the cart with a device snapshot. Lines are clamped to their
    /// `max_quantity` and empty lines are dropped.
    LoadCart(Vec<CartLine>),
    /// Replace the wishlist with a device snapshot.
    LoadWishlist(Vec<WishlistEntry>),
    /// Merge into the matching variant line, or append.
    AddToCart(CartLine),
    RemoveFromCart(CartLineId),
    /// Set a line's quantity; zero or less removes the line.
    UpdateCartQuantity { id: CartLineId, quantity: i64 },
    ClearCart,
    /// Append unless the product is already saved.
    AddToWishlist(WishlistEntry),
    RemoveFromWishlist(WishlistEntryId),
    /// Replace the cart with the authoritative remote payload.
    CartSyncSucceeded(Vec<CartLine>),
    /// Replace the wishlist with the authoritative remote payload.
    WishlistSyncSucceeded(Vec<WishlistEntry>),
}

impl Action {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetLoading(_) => "set_loading",
            Self::SetSyncing(_) => "set_syncing",
            Self::LoadCart(_) => "load_cart",
            Self::LoadWishlist(_) => "load_wishlist",
            Self::AddToCart(_) => "add_to_cart",
            Self::RemoveFromCart(_) => "remove_from_cart",
            Self::UpdateCartQuantity { .. } => "update_cart_quantity",
            Self::ClearCart => "clear_cart",
            Self::AddToWishlist(_) => "add_to_wishlist",
            Self::RemoveFromWishlist(_) => "remove_from_wishlist",
            Self::CartSyncSucceeded(_) => "cart_sync_succeeded",
            Self::WishlistSyncSucceeded(_) => "wishlist_sync_succeeded",
        }
    }
}

/// Apply an action to a state, producing the next state.
#[must_use]
pub fn transition(state: &AppState, action: Action) -> AppState {
    let loading = state.is_loading();
    let syncing = state.is_syncing();
    let cart = || state.cart().to_vec();
    let wishlist = || state.wishlist().to_vec();

    match action {
        Action::SetLoading(value) => AppState::from_parts(cart(), wishlist(), value, syncing),
        Action::SetSyncing(value) => AppState::from_parts(cart(), wishlist(), loading, value),
        Action::LoadCart(lines) => {
            AppState::from_parts(normalize_lines(lines), wishlist(), loading, syncing)
        }
        Action::LoadWishlist(entries) => AppState::from_parts(cart(), entries, loading, syncing),
        Action::AddToCart(line) => {
            AppState::from_parts(add_line(state.cart(), line), wishlist(), loading, syncing)
        }
        Action::RemoveFromCart(id) => {
            let lines = state
                .cart()
                .iter()
                .filter(|line| line.id != id)
                .cloned()
                .collect();
            AppState::from_parts(lines, wishlist(), loading, syncing)
        }
        Action::UpdateCartQuantity { id, quantity } => AppState::from_parts(
            update_line(state.cart(), &id, quantity),
            wishlist(),
            loading,
            syncing,
        ),
        Action::ClearCart => AppState::from_parts(Vec::new(), wishlist(), loading, syncing),
        Action::AddToWishlist(entry) => {
            if state.has_wishlisted(&entry.product_id) {
                return state.clone();
            }
            let mut entries = wishlist();
            entries.push(entry);
            AppState::from_parts(cart(), entries, loading, syncing)
        }
        Action::RemoveFromWishlist(id) => {
            let entries = state
                .wishlist()
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect();
            AppState::from_parts(cart(), entries, loading, syncing)
        }
        Action::CartSyncSucceeded(lines) => AppState::from_parts(lines, wishlist(), loading, false),
        Action::WishlistSyncSucceeded(entries) => {
            AppState::from_parts(cart(), entries, loading, false)
        }
    }
}

fn add_line(lines: &[CartLine], incoming: CartLine) -> Vec<CartLine> {
    let existing = lines.iter().position(|line| {
        line.is_variant(
            &incoming.product_id,
            incoming.color.as_deref(),
            incoming.size.as_deref(),
        )
    });

    match existing {
        Some(index) => lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == index {
                    CartLine {
                        quantity: line
                            .quantity
                            .saturating_add(incoming.quantity)
                            .min(line.max_quantity),
                        ..line.clone()
                    }
                } else {
                    line.clone()
                }
            })
            .collect(),
        None => {
            let quantity = incoming.quantity.min(incoming.max_quantity);
            let mut next = lines.to_vec();
            if quantity > 0 {
                next.push(CartLine {
                    quantity,
                    ..incoming
                });
            }
            next
        }
    }
}

/// Clamp each line to its `max_quantity`, dropping lines left empty.
pub(crate) fn normalize_lines(lines: Vec<CartLine>) -> Vec<CartLine> {
    lines
        .into_iter()
        .filter_map(|line| {
            let quantity = line.quantity.min(line.max_quantity);
            (quantity > 0).then_some(CartLine { quantity, ..line })
        })
        .collect()
}

fn update_line(lines: &[CartLine], id: &CartLineId, quantity: i64) -> Vec<CartLine> {
    lines
        .iter()
        .filter_map(|line| {
            if &line.id != id {
                return Some(line.clone());
            }
            let clamped = quantity.min(i64::from(line.max_quantity));
            u32::try_from(clamped)
                .ok()
                .filter(|q| *q > 0)
                .map(|quantity| CartLine {
                    quantity,
                    ..line.clone()
                })
        })
        .collect()
}
