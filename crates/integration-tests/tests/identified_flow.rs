//! Signed-in shopper: the remote service is authoritative.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use basket_core::{CartLineId, IdentityStatus, Phase, ProductId, WishlistEntryId};
use basket_integration_tests::{
    Call, Harness, Op, cart_draft, remote_line, signed_in, wish_draft,
};
use basket_sync::StoreError;
use basket_sync::remote::RemoteError;

async fn identified(h: &Harness) {
    h.store.handle_identity(signed_in()).await;
    assert_eq!(h.store.phase(), Phase::IdentifiedReady);
    h.remote.reset_calls();
}

#[tokio::test]
async fn test_sign_in_loads_remote_collections() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);

    h.store.handle_identity(IdentityStatus::Resolving).await;
    assert!(h.store.state().is_loading());
    h.store.handle_identity(signed_in()).await;

    let state = h.store.state();
    assert!(!state.is_loading());
    assert_eq!(state.cart_count(), 2);
    assert_eq!(h.remote.count(Op::ListCart), 1);
    assert_eq!(h.remote.count(Op::ListWishlist), 1);
}

#[tokio::test]
async fn test_cold_start_fetch_failure_still_settles() {
    let h = Harness::new();
    h.remote.fail(Op::ListCart);
    h.remote.seed_wishlist(Vec::new());

    h.store.handle_identity(signed_in()).await;

    let state = h.store.state();
    assert_eq!(h.store.phase(), Phase::IdentifiedReady);
    assert!(!state.is_loading());
    assert!(!state.is_syncing());
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_add_creates_remote_line() {
    let h = Harness::new();
    identified(&h).await;

    h.store.add_to_cart(cart_draft("tee", 2, 5)).await.unwrap();

    let state = h.store.state();
    assert_eq!(state.cart().len(), 1);
    assert!(!state.cart()[0].id.is_local());
    assert_eq!(state.cart()[0].id, h.remote.cart()[0].id);
    assert_eq!(state.cart_count(), 2);
    assert_eq!(h.remote.count(Op::CreateLine), 1);
}

#[tokio::test]
async fn test_remove_issues_exactly_one_delete() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;
    let id = CartLineId::remote("line-1");

    h.store.remove_from_cart(&id).await.unwrap();

    assert_eq!(h.remote.calls(), vec![Call::DeleteLine(id)]);
    assert!(h.store.state().cart().is_empty());
    assert!(h.remote.cart().is_empty());
}

#[tokio::test]
async fn test_failed_remove_keeps_line_and_reports() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;
    h.remote.fail(Op::DeleteLine);
    let before = h.store.state();

    let err = h
        .store
        .remove_from_cart(&CartLineId::remote("line-1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Remote(RemoteError::Api { status: 503, .. })
    ));
    assert!(err.is_transient());
    let after = h.store.state();
    assert_eq!(after, before);
    assert!(!after.is_syncing());
}

#[tokio::test]
async fn test_failed_add_leaves_state_unchanged() {
    let h = Harness::new();
    identified(&h).await;
    h.remote.fail(Op::CreateLine);
    let before = h.store.state();

    assert!(h.store.add_to_cart(cart_draft("tee", 1, 5)).await.is_err());
    assert_eq!(h.store.state(), before);

    h.remote.recover(Op::CreateLine);
    h.store.add_to_cart(cart_draft("tee", 1, 5)).await.unwrap();
    assert_eq!(h.store.state().cart_count(), 1);
}

#[tokio::test]
async fn test_update_sends_clamped_quantity() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;
    let id = CartLineId::remote("line-1");

    h.store.update_cart_quantity(&id, 40).await.unwrap();

    assert_eq!(h.remote.calls(), vec![Call::UpdateLine(id, 10)]);
    assert_eq!(h.store.state().cart()[0].quantity, 10);
}

#[tokio::test]
async fn test_update_to_zero_deletes_remote_line() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;
    let id = CartLineId::remote("line-1");

    h.store.update_cart_quantity(&id, 0).await.unwrap();

    assert_eq!(h.remote.calls(), vec![Call::DeleteLine(id)]);
    assert!(h.store.state().cart().is_empty());
}

#[tokio::test]
async fn test_clear_clears_remote_cart() {
    let h = Harness::new();
    h.remote.seed_cart(vec![
        remote_line("line-1", "tee", 2),
        remote_line("line-2", "mug", 1),
    ]);
    identified(&h).await;

    h.store.clear_cart().await.unwrap();

    assert_eq!(h.remote.calls(), vec![Call::ClearCart]);
    assert_eq!(h.store.state().cart_count(), 0);
}

#[tokio::test]
async fn test_local_line_is_handled_locally_while_identified() {
    let h = Harness::new();
    h.store.handle_identity(IdentityStatus::Anonymous).await;
    h.store.add_to_cart(cart_draft("tee", 2, 5)).await.unwrap();
    let local = h.store.state().cart()[0].id.clone();

    // Remote cart listing fails, so the guest line is still on screen.
    h.remote.fail(Op::ListCart);
    h.remote.fail(Op::CreateLine);
    identified(&h).await;
    assert_eq!(h.store.state().line(&local).map(|l| l.quantity), Some(2));

    h.store.update_cart_quantity(&local, 3).await.unwrap();
    assert_eq!(h.store.state().line(&local).map(|l| l.quantity), Some(3));

    h.store.remove_from_cart(&local).await.unwrap();
    assert!(h.store.state().line(&local).is_none());
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn test_wishlist_round_trip_through_remote() {
    let h = Harness::new();
    identified(&h).await;

    h.store.add_to_wishlist(wish_draft("hat")).await.unwrap();
    h.store.add_to_wishlist(wish_draft("hat")).await.unwrap();
    assert_eq!(
        h.remote.calls(),
        vec![Call::CreateEntry(ProductId::new("hat"))]
    );

    let id = h.store.state().wishlist()[0].id.clone();
    assert!(!id.is_local());
    h.store.remove_from_wishlist(&id).await.unwrap();

    assert_eq!(h.store.state().wishlist_count(), 0);
    assert!(h.remote.wishlist().is_empty());
}

#[tokio::test]
async fn test_unknown_entry_makes_no_remote_call() {
    let h = Harness::new();
    identified(&h).await;

    let err = h
        .store
        .remove_from_wishlist(&WishlistEntryId::remote("missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::EntryNotFound(_)));
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn test_syncing_flag_tracks_outstanding_call() {
    let h = Harness::new();
    identified(&h).await;
    let gate = h.remote.hold();

    let pending = tokio::spawn({
        let store = h.store.clone();
        async move { store.add_to_cart(cart_draft("tee", 1, 5)).await }
    });

    let mut states = h.store.subscribe();
    states.wait_for(basket_sync::AppState::is_syncing).await.unwrap();
    assert!(h.store.state().cart().is_empty());

    gate.add_permits(1);
    pending.await.unwrap().unwrap();

    let state = h.store.state();
    assert!(!state.is_syncing());
    assert_eq!(state.cart_count(), 1);
}

#[tokio::test]
async fn test_resync_reports_failure_but_applies_other_collection() {
    let h = Harness::new();
    identified(&h).await;
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 3)]);
    h.remote.fail(Op::ListWishlist);

    let err = h.store.resync().await.unwrap_err();

    assert!(matches!(err, StoreError::Remote(_)));
    assert_eq!(h.store.state().cart_count(), 3);
}

#[tokio::test]
async fn test_sign_out_starts_fresh_guest_session() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;
    assert_eq!(h.store.state().cart_count(), 2);

    h.store.handle_identity(IdentityStatus::Anonymous).await;

    assert_eq!(h.store.phase(), Phase::GuestReady);
    assert!(h.store.state().cart().is_empty());
    assert_eq!(h.remote.cart().len(), 1);
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn test_add_shows_server_total_when_line_was_not_loaded() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    // The cold-start listing fails, so the existing remote line is not on screen.
    h.remote.fail(Op::ListCart);
    identified(&h).await;
    h.remote.recover(Op::ListCart);
    assert!(h.store.state().cart().is_empty());

    h.store.add_to_cart(cart_draft("tee", 1, 5)).await.unwrap();

    let state = h.store.state();
    assert_eq!(state.cart().len(), 1);
    assert_eq!(state.cart()[0].id, CartLineId::remote("line-1"));
    assert_eq!(state.cart()[0].quantity, 3);
    assert_eq!(state.cart()[0].quantity, h.remote.cart()[0].quantity);
}

#[tokio::test]
async fn test_add_onto_loaded_line_adds_only_the_new_units() {
    let h = Harness::new();
    h.remote.seed_cart(vec![remote_line("line-1", "tee", 2)]);
    identified(&h).await;

    h.store.add_to_cart(cart_draft("tee", 1, 5)).await.unwrap();

    let state = h.store.state();
    assert_eq!(state.cart().len(), 1);
    assert_eq!(state.cart_count(), 3);
    assert_eq!(h.remote.cart()[0].quantity, 3);
}
