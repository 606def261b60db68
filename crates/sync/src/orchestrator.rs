//! Identity-driven routing and the merge-on-sign-in protocol.
//!
//! The orchestrator decides, for every call, whether the device snapshot or
//! the remote service is authoritative:
//!
//! - **Guest** (anonymous): mutations apply to the transition function
//!   immediately and new IDs are minted locally. Every change to the
//!   collections is written to the device snapshot unless the store is loading.
//! - **Identified**: mutations call the remote service first and only apply
//!   on success. Failures are returned to the caller with state unchanged.
//! - Lines whose ID is locally minted never reach the remote service; they
//!   have nothing to call against, even while identified.
//!
//! When the shopper becomes identified, local cart lines still in the device
//! snapshot are pushed to the remote cart once per signed-in session.

use std::future::Future;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use basket_core::{
    CartLine, CartLineDraft, CartLineId, Identity, IdentityStatus, Phase, WishlistDraft,
    WishlistEntryId,
};

use crate::error::{Result, StoreError, report_background_error};
use crate::persistence::GuestSnapshot;
use crate::remote::{CreateLine, RemoteError, RemoteSync};
use crate::state::AppState;
use crate::transition::{Action, normalize_lines, transition};

/// Outcome of pushing local cart lines to the remote cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Local lines found in the device snapshot.
    pub attempted: usize,
    /// Lines the remote cart accepted.
    pub merged: usize,
    /// Lines that failed and were dropped with the snapshot.
    pub failed: usize,
}

/// Identity lifecycle bookkeeping.
#[derive(Debug, Clone, Default)]
struct Session {
    phase: Phase,
    identity: Option<Identity>,
    /// Set on the first identified resolution; reset by the anonymous phase.
    merge_attempted: bool,
}

/// Where a mutation goes.
enum Route {
    Local,
    Remote(Identity),
}

/// Routes mutations between the device snapshot and the remote service.
pub struct Orchestrator {
    state: watch::Sender<AppState>,
    session: watch::Sender<Session>,
    snapshot: GuestSnapshot,
    remote: RemoteSync,
}

impl Orchestrator {
    #[must_use]
    pub fn new(snapshot: GuestSnapshot, remote: RemoteSync) -> Self {
        let (state, _) = watch::channel(AppState::initial());
        let (session, _) = watch::channel(Session::default());
        Self {
            state,
            session,
            snapshot,
            remote,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.borrow().phase
    }

    // =========================================================================
    // Identity lifecycle
    // =========================================================================

    /// Advance the lifecycle for a new identity signal value.
    ///
    /// Returns the merge report when this step pushed local cart lines to the
    /// remote cart.
    pub async fn handle_identity(&self, status: IdentityStatus) -> Option<MergeReport> {
        match status {
            IdentityStatus::Resolving => {
                self.set_phase(Phase::Resolving);
                self.dispatch(Action::SetLoading(true));
                None
            }
            IdentityStatus::Anonymous => {
                self.enter_guest();
                None
            }
            IdentityStatus::Identified(identity) => self.enter_identified(identity).await,
        }
    }

    fn enter_guest(&self) {
        let previous = self.phase();
        if previous == Phase::GuestReady {
            debug!("Already in guest mode");
            return;
        }
        if previous.is_identified() {
            info!("Shopper signed out; starting a fresh guest session");
        }

        self.session.send_modify(|session| {
            session.phase = Phase::GuestReady;
            session.identity = None;
            session.merge_attempted = false;
        });
        self.reload_guest();
    }

    async fn enter_identified(&self, identity: Identity) -> Option<MergeReport> {
        let previous = self.phase();
        info!(subject = %identity.subject, from = ?previous, "Shopper identified");

        self.session.send_modify(|session| {
            session.phase = Phase::SyncingRemote;
            session.identity = Some(identity.clone());
        });
        self.dispatch(Action::SetLoading(true));

        for error in self.fetch_remote(&identity).await {
            report_background_error("fetching remote collections", &error);
        }

        self.set_phase(Phase::IdentifiedReady);
        self.dispatch(Action::SetLoading(false));

        let first_resolution = self.session.send_if_modified(|session| {
            if session.merge_attempted {
                false
            } else {
                session.merge_attempted = true;
                true
            }
        });
        if !first_resolution {
            debug!("Guest cart already merged for this session");
            return None;
        }

        self.merge_guest_cart(&identity).await
    }

    /// Push local cart lines from the device snapshot to the remote cart.
    ///
    /// Each line is attempted independently. The cart snapshot is cleared
    /// afterwards whether or not every line made it.
    async fn merge_guest_cart(&self, identity: &Identity) -> Option<MergeReport> {
        let lines = self.snapshot.read_cart().unwrap_or_else(|e| {
            report_background_error("reading cart snapshot for merge", &e);
            Vec::new()
        });
        let local: Vec<CartLine> = normalize_lines(lines)
            .into_iter()
            .filter(|line| line.id.is_local())
            .collect();
        if local.is_empty() {
            return None;
        }

        info!(lines = local.len(), "Merging guest cart into remote cart");
        let mut report = MergeReport {
            attempted: local.len(),
            ..MergeReport::default()
        };

        for line in &local {
            let request = CreateLine::from(line);
            match self.syncing(self.remote.create_line(identity, &request)).await {
                Ok(_) => report.merged += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "Failed to merge guest cart line"
                    );
                    report_background_error("merging guest cart line", &e);
                }
            }
        }

        // TODO: keep failed lines in the snapshot so a later sign-in can retry them.
        if let Err(e) = self.snapshot.clear_cart() {
            report_background_error("clearing cart snapshot after merge", &e);
        }

        if report.merged > 0 {
            match self.remote.fetch_cart(identity).await {
                Ok(action) => self.dispatch(action),
                Err(e) => report_background_error("refreshing cart after merge", &e),
            }
        }

        info!(
            attempted = report.attempted,
            merged = report.merged,
            failed = report.failed,
            "Guest cart merge finished"
        );
        Some(report)
    }

    /// Replace the collections with the device snapshot.
    fn reload_guest(&self) {
        self.dispatch(Action::SetLoading(true));
        let data = self.snapshot.load();
        self.dispatch(Action::LoadCart(data.cart));
        self.dispatch(Action::LoadWishlist(data.wishlist));
        self.dispatch(Action::SetLoading(false));
    }

    /// Fetch both remote collections concurrently, applying whichever succeed.
    async fn fetch_remote(&self, identity: &Identity) -> Vec<RemoteError> {
        let (cart, wishlist) = tokio::join!(
            self.remote.fetch_cart(identity),
            self.remote.fetch_wishlist(identity)
        );

        [cart, wishlist]
            .into_iter()
            .filter_map(|result| match result {
                Ok(action) => {
                    self.dispatch(action);
                    None
                }
                Err(e) => Some(e),
            })
            .collect()
    }

    /// Reload the collections from whichever source is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, or the first remote failure.
    pub async fn resync(&self) -> Result<()> {
        let (phase, identity) = {
            let session = self.session.borrow();
            (session.phase, session.identity.clone())
        };

        match (phase, identity) {
            (phase, _) if !phase.accepts_mutations() => Err(StoreError::NotReady),
            (phase, Some(identity)) if phase.is_identified() => {
                match self.fetch_remote(&identity).await.into_iter().next() {
                    Some(error) => Err(error.into()),
                    None => Ok(()),
                }
            }
            _ => {
                self.reload_guest();
                Ok(())
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, or the remote failure when
    /// identified.
    pub async fn add_to_cart(&self, draft: CartLineDraft) -> Result<()> {
        let (has_variant_line, onto_local_line) = {
            let state = self.state.borrow();
            let existing = state.variant_line(
                &draft.product_id,
                draft.color.as_deref(),
                draft.size.as_deref(),
            );
            (existing.is_some(), existing.is_some_and(|line| line.id.is_local()))
        };

        match self.route(onto_local_line)? {
            Route::Local => {
                self.dispatch(Action::AddToCart(draft.into_line(CartLineId::mint())));
            }
            Route::Remote(identity) => {
                let request = CreateLine::from(&draft);
                let line = self
                    .syncing(self.remote.create_line(&identity, &request))
                    .await?;
                // The server merges into its own line and returns the total.
                // Add only the delta when that line is already on screen.
                let line = if has_variant_line {
                    CartLine {
                        quantity: draft.quantity,
                        ..line
                    }
                } else {
                    line
                };
                self.dispatch(Action::AddToCart(line));
            }
        }
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, `LineNotFound` for an unknown line,
    /// or the remote failure when identified.
    pub async fn remove_from_cart(&self, id: &CartLineId) -> Result<()> {
        let route = self.route(id.is_local())?;
        self.require_line(id)?;

        if let Route::Remote(identity) = route {
            self.syncing(self.remote.delete_line(&identity, id)).await?;
        }
        self.dispatch(Action::RemoveFromCart(id.clone()));
        Ok(())
    }

    /// Set a cart line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, `LineNotFound` for an unknown line,
    /// or the remote failure when identified.
    pub async fn update_cart_quantity(&self, id: &CartLineId, quantity: i64) -> Result<()> {
        let route = self.route(id.is_local())?;
        let line = self.require_line(id)?;

        if let Route::Remote(identity) = route {
            let clamped = quantity.min(i64::from(line.max_quantity));
            match u32::try_from(clamped).ok().filter(|q| *q > 0) {
                Some(q) => {
                    self.syncing(self.remote.update_line(&identity, id, q))
                        .await?;
                }
                None => {
                    self.syncing(self.remote.delete_line(&identity, id)).await?;
                }
            }
        }
        self.dispatch(Action::UpdateCartQuantity {
            id: id.clone(),
            quantity,
        });
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, or the remote failure when
    /// identified.
    pub async fn clear_cart(&self) -> Result<()> {
        if let Route::Remote(identity) = self.route(false)? {
            self.syncing(self.remote.clear_cart(&identity)).await?;
        }
        self.dispatch(Action::ClearCart);
        Ok(())
    }

    /// Save a product to the wishlist. Saving a product twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, or the remote failure when
    /// identified.
    pub async fn add_to_wishlist(&self, draft: WishlistDraft) -> Result<()> {
        let route = self.route(false)?;
        if self.state.borrow().has_wishlisted(&draft.product_id) {
            debug!(product_id = %draft.product_id, "Product already on wishlist");
            return Ok(());
        }

        let entry = match route {
            Route::Local => draft.into_entry(WishlistEntryId::mint(), Utc::now()),
            Route::Remote(identity) => {
                self.syncing(self.remote.create_entry(&identity, &draft.product_id))
                    .await?
            }
        };
        self.dispatch(Action::AddToWishlist(entry));
        Ok(())
    }

    /// Remove a wishlist entry.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` while resolving, `EntryNotFound` for an unknown
    /// entry, or the remote failure when identified.
    pub async fn remove_from_wishlist(&self, id: &WishlistEntryId) -> Result<()> {
        let route = self.route(id.is_local())?;
        if self.state.borrow().wishlist_entry(id).is_none() {
            return Err(StoreError::EntryNotFound(id.clone()));
        }

        if let Route::Remote(identity) = route {
            self.syncing(self.remote.delete_entry(&identity, id)).await?;
        }
        self.dispatch(Action::RemoveFromWishlist(id.clone()));
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply an action, persisting the guest snapshot when the collections
    /// changed outside the loading window.
    fn dispatch(&self, action: Action) {
        let name = action.name();
        let guest = self.phase() == Phase::GuestReady;

        self.state.send_modify(|state| {
            let next = transition(state, action);
            if guest && !next.is_loading() && !next.same_collections(state) {
                if let Err(e) = self.snapshot.save(&next) {
                    report_background_error("persisting guest snapshot", &e);
                }
            }
            *state = next;
        });

        trace!(action = name, "Dispatched");
    }

    fn set_phase(&self, phase: Phase) {
        self.session.send_modify(|session| session.phase = phase);
    }

    fn route(&self, targets_local_line: bool) -> Result<Route> {
        let session = self.session.borrow();
        if !session.phase.accepts_mutations() {
            return Err(StoreError::NotReady);
        }
        match &session.identity {
            Some(identity) if session.phase.is_identified() && !targets_local_line => {
                Ok(Route::Remote(identity.clone()))
            }
            _ => Ok(Route::Local),
        }
    }

    fn require_line(&self, id: &CartLineId) -> Result<CartLine> {
        self.state
            .borrow()
            .line(id)
            .cloned()
            .ok_or_else(|| StoreError::LineNotFound(id.clone()))
    }

    /// Run a mutating remote call with `is_syncing` raised.
    ///
    /// The flag is a single boolean: it drops when this call settles even if
    /// another call is still in flight.
    async fn syncing<T, F>(&self, call: F) -> std::result::Result<T, RemoteError>
    where
        F: Future<Output = std::result::Result<T, RemoteError>>,
    {
        self.dispatch(Action::SetSyncing(true));
        let result = call.await;
        self.dispatch(Action::SetSyncing(false));
        result
    }
}
