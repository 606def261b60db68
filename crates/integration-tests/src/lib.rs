//! Integration test support for the Basket store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p basket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `guest_flow` - Anonymous shopper against the device snapshot
//! - `identified_flow` - Signed-in shopper against the remote service
//! - `merge_on_sign_in` - Guest cart pushed to the remote cart on sign-in
//! - `properties` - Property tests for the transition function
//!
//! [`FakeRemote`] is an in-memory cart service that records every call and
//! can be told to fail or stall specific operations.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use basket_core::{
    CartLine, CartLineDraft, CartLineId, CurrencyCode, Identity, IdentityStatus, Price, ProductId,
    WishlistDraft, WishlistEntry, WishlistEntryId,
};
use basket_sync::CartStore;
use basket_sync::persistence::{CART_KEY, MemorySnapshotStore, SnapshotStore, WISHLIST_KEY};
use basket_sync::remote::{CreateLine, RemoteCart, RemoteError, RemoteSync, RemoteWishlist};

/// Remote operation kinds, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListCart,
    CreateLine,
    UpdateLine,
    DeleteLine,
    ClearCart,
    ListWishlist,
    CreateEntry,
    DeleteEntry,
}

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListCart,
    CreateLine(CreateLine),
    UpdateLine(CartLineId, u32),
    DeleteLine(CartLineId),
    ClearCart,
    ListWishlist,
    CreateEntry(ProductId),
    DeleteEntry(WishlistEntryId),
}

impl Call {
    #[must_use]
    pub const fn op(&self) -> Op {
        match self {
            Self::ListCart => Op::ListCart,
            Self::CreateLine(_) => Op::CreateLine,
            Self::UpdateLine(..) => Op::UpdateLine,
            Self::DeleteLine(_) => Op::DeleteLine,
            Self::ClearCart => Op::ClearCart,
            Self::ListWishlist => Op::ListWishlist,
            Self::CreateEntry(_) => Op::CreateEntry,
            Self::DeleteEntry(_) => Op::DeleteEntry,
        }
    }
}

#[derive(Default)]
struct Server {
    cart: Vec<CartLine>,
    wishlist: Vec<WishlistEntry>,
    calls: Vec<Call>,
    failing: HashSet<Op>,
    failing_products: HashSet<ProductId>,
    next_id: u64,
}

impl Server {
    fn mint(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("gid://{kind}/{}", self.next_id)
    }
}

/// In-memory cart and wishlist service.
#[derive(Default)]
pub struct FakeRemote {
    server: Mutex<Server>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail with a 503.
    pub fn fail(&self, op: Op) {
        self.server().failing.insert(op);
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: Op) {
        self.server().failing.remove(&op);
    }

    /// Make line creation fail for one product.
    pub fn fail_product(&self, product_id: &str) {
        self.server().failing_products.insert(ProductId::new(product_id));
    }

    /// Hold every call until the returned semaphore is given permits.
    #[must_use]
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    /// Replace the remote cart.
    pub fn seed_cart(&self, lines: Vec<CartLine>) {
        self.server().cart = lines;
    }

    /// Replace the remote wishlist.
    pub fn seed_wishlist(&self, entries: Vec<WishlistEntry>) {
        self.server().wishlist = entries;
    }

    #[must_use]
    pub fn cart(&self) -> Vec<CartLine> {
        self.server().cart.clone()
    }

    #[must_use]
    pub fn wishlist(&self) -> Vec<WishlistEntry> {
        self.server().wishlist.clone()
    }

    /// Every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.server().calls.clone()
    }

    /// Number of calls of one kind.
    #[must_use]
    pub fn count(&self, op: Op) -> usize {
        self.server().calls.iter().filter(|call| call.op() == op).count()
    }

    pub fn reset_calls(&self) {
        self.server().calls.clear();
    }

    fn server(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, wait on the gate, then check injected failures.
    async fn enter(&self, call: Call) -> Result<MutexGuard<'_, Server>, RemoteError> {
        let op = call.op();
        self.server().calls.push(call);

        let gate = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let server = self.server();
        if server.failing.contains(&op) {
            return Err(RemoteError::Api {
                status: 503,
                message: format!("{op:?} unavailable"),
            });
        }
        Ok(server)
    }
}

#[async_trait]
impl RemoteCart for FakeRemote {
    async fn list(&self, _: &Identity) -> Result<Vec<CartLine>, RemoteError> {
        let server = self.enter(Call::ListCart).await?;
        Ok(server.cart.clone())
    }

    async fn create(&self, _: &Identity, line: &CreateLine) -> Result<CartLine, RemoteError> {
        let mut server = self.enter(Call::CreateLine(line.clone())).await?;
        if server.failing_products.contains(&line.product_id) {
            return Err(RemoteError::Api {
                status: 422,
                message: format!("{} is unavailable", line.product_id),
            });
        }

        let (color, size) = (line.color.as_deref(), line.size.as_deref());
        if let Some(existing) = server
            .cart
            .iter_mut()
            .find(|existing| existing.is_variant(&line.product_id, color, size))
        {
            existing.quantity = existing
                .quantity
                .saturating_add(line.quantity)
                .min(existing.max_quantity);
            return Ok(existing.clone());
        }

        let id = CartLineId::remote(server.mint("cart/Line"));
        let created = CartLineDraft {
            color: line.color.clone(),
            size: line.size.clone(),
            ..cart_draft(line.product_id.as_str(), line.quantity, 10)
        }
        .into_line(id);
        server.cart.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        _: &Identity,
        id: &CartLineId,
        quantity: u32,
    ) -> Result<CartLine, RemoteError> {
        let mut server = self.enter(Call::UpdateLine(id.clone(), quantity)).await?;
        let line = server
            .cart
            .iter_mut()
            .find(|line| &line.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn delete(&self, _: &Identity, id: &CartLineId) -> Result<(), RemoteError> {
        let mut server = self.enter(Call::DeleteLine(id.clone())).await?;
        let before = server.cart.len();
        server.cart.retain(|line| &line.id != id);
        if server.cart.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn clear(&self, _: &Identity) -> Result<(), RemoteError> {
        let mut server = self.enter(Call::ClearCart).await?;
        server.cart.clear();
        Ok(())
    }
}

#[async_trait]
impl RemoteWishlist for FakeRemote {
    async fn list(&self, _: &Identity) -> Result<Vec<WishlistEntry>, RemoteError> {
        let server = self.enter(Call::ListWishlist).await?;
        Ok(server.wishlist.clone())
    }

    async fn create(
        &self,
        _: &Identity,
        product_id: &ProductId,
    ) -> Result<WishlistEntry, RemoteError> {
        let mut server = self.enter(Call::CreateEntry(product_id.clone())).await?;
        if let Some(existing) = server
            .wishlist
            .iter()
            .find(|entry| &entry.product_id == product_id)
        {
            return Ok(existing.clone());
        }

        let id = WishlistEntryId::remote(server.mint("wishlist/Entry"));
        let entry = wish_draft(product_id.as_str()).into_entry(id, fixed_time());
        server.wishlist.push(entry.clone());
        Ok(entry)
    }

    async fn delete(&self, _: &Identity, id: &WishlistEntryId) -> Result<(), RemoteError> {
        let mut server = self.enter(Call::DeleteEntry(id.clone())).await?;
        let before = server.wishlist.len();
        server.wishlist.retain(|entry| &entry.id != id);
        if server.wishlist.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Store wired to an in-memory snapshot and a [`FakeRemote`].
pub struct Harness {
    pub store: CartStore,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub remote: Arc<FakeRemote>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshots(Arc::new(MemorySnapshotStore::new()))
    }

    /// Harness over an existing snapshot store, as after an app restart.
    #[must_use]
    pub fn with_snapshots(snapshots: Arc<MemorySnapshotStore>) -> Self {
        let remote = Arc::new(FakeRemote::new());
        let sync = RemoteSync::new(remote.clone(), remote.clone(), Duration::from_secs(5));
        Self {
            store: CartStore::new(snapshots.clone(), sync),
            snapshots,
            remote,
        }
    }

    /// Cart lines currently in the device snapshot.
    #[must_use]
    pub fn snapshot_cart(&self) -> Vec<CartLine> {
        read_json(&self.snapshots, CART_KEY)
    }

    /// Wishlist entries currently in the device snapshot.
    #[must_use]
    pub fn snapshot_wishlist(&self) -> Vec<WishlistEntry> {
        read_json(&self.snapshots, WISHLIST_KEY)
    }

    /// Write a cart directly into the device snapshot.
    pub fn seed_snapshot_cart(&self, lines: &[CartLine]) {
        let text = serde_json::to_string(lines).unwrap_or_default();
        let _ = self.snapshots.write(CART_KEY, &text);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(store: &MemorySnapshotStore, key: &str) -> Vec<T> {
    store
        .read(key)
        .ok()
        .flatten()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

/// Signed-in shopper.
#[must_use]
pub fn signed_in() -> IdentityStatus {
    IdentityStatus::Identified(Identity::new("customer-42"))
}

/// Cart draft for a product with no variant options.
#[must_use]
pub fn cart_draft(product: &str, quantity: u32, max_quantity: u32) -> CartLineDraft {
    CartLineDraft {
        product_id: ProductId::new(product),
        name: format!("Product {product}"),
        price: Price::from_cents(1999, CurrencyCode::USD),
        image: None,
        slug: product.to_string(),
        color: None,
        size: None,
        quantity,
        stock: max_quantity,
        max_quantity,
    }
}

/// Wishlist draft for a product.
#[must_use]
pub fn wish_draft(product: &str) -> WishlistDraft {
    WishlistDraft {
        product_id: ProductId::new(product),
        name: format!("Product {product}"),
        price: Price::from_cents(1500, CurrencyCode::USD),
        image: None,
        slug: product.to_string(),
        stock: 3,
    }
}

/// Remote cart line for seeding the fake service.
#[must_use]
pub fn remote_line(id: &str, product: &str, quantity: u32) -> CartLine {
    cart_draft(product, quantity, 10).into_line(CartLineId::remote(id))
}

/// Locally minted cart line, as a guest session would have saved it.
#[must_use]
pub fn local_line(product: &str, quantity: u32) -> CartLine {
    cart_draft(product, quantity, 10).into_line(CartLineId::mint())
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
