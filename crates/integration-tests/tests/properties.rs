//! Property-based tests for the transition function.

use basket_core::CartLineId;
use basket_integration_tests::{cart_draft, local_line, wish_draft};
use basket_sync::transition::transition;
use basket_sync::{Action, AppState};
use proptest::prelude::*;

/// Cart actions over a small pool of products so lines collide often.
fn cart_action() -> impl Strategy<Value = Action> {
    let product = prop::sample::select(vec!["tee", "mug", "hat"]);
    prop_oneof![
        (product.clone(), 0..8u32, 1..6u32).prop_map(|(p, q, max)| {
            Action::AddToCart(cart_draft(p, q, max).into_line(CartLineId::mint()))
        }),
        (0..3usize, -3..9i64).prop_map(|(index, quantity)| Action::UpdateCartQuantity {
            // Resolved against the current state in the test body.
            id: CartLineId::remote(index.to_string()),
            quantity,
        }),
        (0..3usize).prop_map(|index| Action::RemoveFromCart(CartLineId::remote(index.to_string()))),
        Just(Action::ClearCart),
        product.clone().prop_map(|p| Action::AddToWishlist(
            wish_draft(p).into_entry(basket_core::WishlistEntryId::mint(), chrono::Utc::now())
        )),
        (prop::collection::vec((product, 1..5u32), 0..4)).prop_map(|lines| {
            Action::LoadCart(lines.into_iter().map(|(p, q)| local_line(p, q)).collect())
        }),
    ]
}

/// Point index-based actions at a real line when one exists.
fn resolve(state: &AppState, action: Action) -> Action {
    let pick = |id: &CartLineId| {
        id.value()
            .parse::<usize>()
            .ok()
            .and_then(|i| state.cart().get(i % state.cart().len().max(1)))
            .map_or_else(|| id.clone(), |line| line.id.clone())
    };
    match action {
        Action::UpdateCartQuantity { id, quantity } => Action::UpdateCartQuantity {
            id: pick(&id),
            quantity,
        },
        Action::RemoveFromCart(id) => Action::RemoveFromCart(pick(&id)),
        other => other,
    }
}

proptest! {
    #[test]
    fn test_counts_always_match_collections(actions in prop::collection::vec(cart_action(), 0..40)) {
        let mut state = AppState::initial();
        for action in actions {
            let action = resolve(&state, action);
            state = transition(&state, action);

            let total: u64 = state.cart().iter().map(|line| u64::from(line.quantity)).sum();
            prop_assert_eq!(state.cart_count(), total);
            prop_assert_eq!(state.wishlist_count(), state.wishlist().len());
            prop_assert!(state.cart().iter().all(|line| line.quantity >= 1));
            prop_assert!(state.cart().iter().all(|line| line.quantity <= line.max_quantity.max(1)));
        }
    }

    #[test]
    fn test_repeated_adds_clamp_to_sum_or_max(
        quantities in prop::collection::vec(1..10u32, 1..8),
        max in 1..20u32,
    ) {
        let mut state = AppState::initial();
        for quantity in &quantities {
            let line = cart_draft("tee", *quantity, max).into_line(CartLineId::mint());
            state = transition(&state, Action::AddToCart(line));
        }

        let sum: u32 = quantities.iter().sum();
        prop_assert_eq!(state.cart().len(), 1);
        prop_assert_eq!(state.cart_count(), u64::from(sum.min(max)));
    }

    #[test]
    fn test_wishlist_never_holds_duplicate_products(
        products in prop::collection::vec(prop::sample::select(vec!["tee", "mug", "hat"]), 0..20),
    ) {
        let mut state = AppState::initial();
        for product in products {
            let entry = wish_draft(product)
                .into_entry(basket_core::WishlistEntryId::mint(), chrono::Utc::now());
            state = transition(&state, Action::AddToWishlist(entry));
        }

        let mut seen: Vec<_> = state.wishlist().iter().map(|e| e.product_id.clone()).collect();
        let len = seen.len();
        seen.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        seen.dedup();
        prop_assert_eq!(seen.len(), len);
    }
}
