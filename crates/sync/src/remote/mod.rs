//! Remote cart and wishlist service.
//!
//! # Architecture
//!
//! - [`RemoteCart`] / [`RemoteWishlist`] are the service seams; the store never
//!   talks HTTP directly
//! - [`HttpRemote`] implements both against a JSON REST service
//! - [`RemoteSync`] is the adapter the orchestrator calls: it applies the
//!   per-call timeout and translates fetched collections into [`Action`]s
//!
//! Every call carries the signed-in [`Identity`] so implementations can
//! authenticate per shopper.

mod http;
mod wire;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use basket_core::{
    CartLine, CartLineDraft, CartLineId, Identity, ProductId, WishlistEntry, WishlistEntryId,
};

pub use http::HttpRemote;
pub use wire::{RemoteCartLine, RemoteWishlistEntry};

use crate::transition::Action;

/// Errors that can occur when calling the remote cart service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The call did not settle within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No remote service is configured.
    #[error("No remote service configured")]
    Unconfigured,
}

impl RemoteError {
    /// Whether retrying the same call later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::NotFound(_) | Self::InvalidEndpoint(_) | Self::Unconfigured => {
                false
            }
        }
    }
}

/// Request body for creating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl From<&CartLine> for CreateLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            color: line.color.clone(),
            size: line.size.clone(),
        }
    }
}

impl From<&CartLineDraft> for CreateLine {
    fn from(draft: &CartLineDraft) -> Self {
        Self {
            product_id: draft.product_id.clone(),
            quantity: draft.quantity,
            color: draft.color.clone(),
            size: draft.size.clone(),
        }
    }
}

/// Remote cart service.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// List the shopper's cart lines.
    async fn list(&self, identity: &Identity) -> Result<Vec<CartLine>, RemoteError>;

    /// Create (or add to) a line; returns the line with its remote ID.
    async fn create(&self, identity: &Identity, line: &CreateLine)
    -> Result<CartLine, RemoteError>;

    /// Set a line's quantity.
    async fn update(
        &self,
        identity: &Identity,
        id: &CartLineId,
        quantity: u32,
    ) -> Result<CartLine, RemoteError>;

    /// Delete a line.
    async fn delete(&self, identity: &Identity, id: &CartLineId) -> Result<(), RemoteError>;

    /// Delete every line.
    async fn clear(&self, identity: &Identity) -> Result<(), RemoteError>;
}

/// Remote wishlist service.
#[async_trait]
pub trait RemoteWishlist: Send + Sync {
    /// List the shopper's wishlist.
    async fn list(&self, identity: &Identity) -> Result<Vec<WishlistEntry>, RemoteError>;

    /// Save a product; returns the entry with its remote ID.
    async fn create(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<WishlistEntry, RemoteError>;

    /// Remove an entry.
    async fn delete(&self, identity: &Identity, id: &WishlistEntryId)
    -> Result<(), RemoteError>;
}

/// Stand-in for deployments without a cart service; every call fails with
/// [`RemoteError::Unconfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteCart for OfflineRemote {
    async fn list(&self, _: &Identity) -> Result<Vec<CartLine>, RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn create(&self, _: &Identity, _: &CreateLine) -> Result<CartLine, RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn update(&self, _: &Identity, _: &CartLineId, _: u32) -> Result<CartLine, RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn delete(&self, _: &Identity, _: &CartLineId) -> Result<(), RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn clear(&self, _: &Identity) -> Result<(), RemoteError> {
        Err(RemoteError::Unconfigured)
    }
}

#[async_trait]
impl RemoteWishlist for OfflineRemote {
    async fn list(&self, _: &Identity) -> Result<Vec<WishlistEntry>, RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn create(&self, _: &Identity, _: &ProductId) -> Result<WishlistEntry, RemoteError> {
        Err(RemoteError::Unconfigured)
    }

    async fn delete(&self, _: &Identity, _: &WishlistEntryId) -> Result<(), RemoteError> {
        Err(RemoteError::Unconfigured)
    }
}

/// Adapter between the orchestrator and the remote services.
#[derive(Clone)]
pub struct RemoteSync {
    cart: Arc<dyn RemoteCart>,
    wishlist: Arc<dyn RemoteWishlist>,
    timeout: Duration,
}

impl RemoteSync {
    /// Create an adapter over separate cart and wishlist services.
    #[must_use]
    pub fn new(
        cart: Arc<dyn RemoteCart>,
        wishlist: Arc<dyn RemoteWishlist>,
        timeout: Duration,
    ) -> Self {
        Self {
            cart,
            wishlist,
            timeout,
        }
    }

    /// Create an adapter over one service implementing both traits.
    #[must_use]
    pub fn from_service<S>(service: S, timeout: Duration) -> Self
    where
        S: RemoteCart + RemoteWishlist + 'static,
    {
        let service = Arc::new(service);
        Self::new(service.clone(), service, timeout)
    }

    /// Adapter for guest-only use.
    #[must_use]
    pub fn offline() -> Self {
        Self::from_service(OfflineRemote, Duration::from_secs(1))
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the cart as a replacing action.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    #[instrument(skip(self, identity), fields(subject = %identity.subject))]
    pub async fn fetch_cart(&self, identity: &Identity) -> Result<Action, RemoteError> {
        self.bounded(self.cart.list(identity))
            .await
            .map(Action::CartSyncSucceeded)
    }

    /// Fetch the wishlist as a replacing action.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    #[instrument(skip(self, identity), fields(subject = %identity.subject))]
    pub async fn fetch_wishlist(&self, identity: &Identity) -> Result<Action, RemoteError> {
        self.bounded(self.wishlist.list(identity))
            .await
            .map(Action::WishlistSyncSucceeded)
    }

    /// Create a cart line remotely.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn create_line(
        &self,
        identity: &Identity,
        line: &CreateLine,
    ) -> Result<CartLine, RemoteError> {
        self.bounded(self.cart.create(identity, line)).await
    }

    /// Set a remote line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn update_line(
        &self,
        identity: &Identity,
        id: &CartLineId,
        quantity: u32,
    ) -> Result<CartLine, RemoteError> {
        self.bounded(self.cart.update(identity, id, quantity)).await
    }

    /// Delete a remote line.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn delete_line(&self, identity: &Identity, id: &CartLineId) -> Result<(), RemoteError> {
        self.bounded(self.cart.delete(identity, id)).await
    }

    /// Delete every remote line.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn clear_cart(&self, identity: &Identity) -> Result<(), RemoteError> {
        self.bounded(self.cart.clear(identity)).await
    }

    /// Save a product to the remote wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn create_entry(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<WishlistEntry, RemoteError> {
        self.bounded(self.wishlist.create(identity, product_id)).await
    }

    /// Remove a remote wishlist entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or times out.
    pub async fn delete_entry(
        &self,
        identity: &Identity,
        id: &WishlistEntryId,
    ) -> Result<(), RemoteError> {
        self.bounded(self.wishlist.delete(identity, id)).await
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RemoteError::Timeout)?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct NeverSettles;

    #[async_trait]
    impl RemoteCart for NeverSettles {
        async fn list(&self, _: &Identity) -> Result<Vec<CartLine>, RemoteError> {
            std::future::pending().await
        }
        async fn create(&self, _: &Identity, _: &CreateLine) -> Result<CartLine, RemoteError> {
            std::future::pending().await
        }
        async fn update(&self, _: &Identity, _: &CartLineId, _: u32) -> Result<CartLine, RemoteError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &Identity, _: &CartLineId) -> Result<(), RemoteError> {
            std::future::pending().await
        }
        async fn clear(&self, _: &Identity) -> Result<(), RemoteError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl RemoteWishlist for NeverSettles {
        async fn list(&self, _: &Identity) -> Result<Vec<WishlistEntry>, RemoteError> {
            Ok(Vec::new())
        }
        async fn create(&self, _: &Identity, _: &ProductId) -> Result<WishlistEntry, RemoteError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &Identity, _: &WishlistEntryId) -> Result<(), RemoteError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_call_times_out() {
        let remote = RemoteSync::from_service(NeverSettles, Duration::from_secs(5));
        let identity = Identity::new("c1");

        let err = remote.fetch_cart(&identity).await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout));

        let action = remote.fetch_wishlist(&identity).await.unwrap();
        assert_eq!(action, Action::WishlistSyncSucceeded(Vec::new()));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RemoteError::RateLimited(3).is_transient());
        assert!(
            RemoteError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !RemoteError::Api {
                status: 422,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!RemoteError::NotFound("line".to_string()).is_transient());
    }

    #[tokio::test]
    async fn test_offline_remote_refuses_calls() {
        let remote = RemoteSync::offline();
        let err = remote.fetch_cart(&Identity::new("c1")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unconfigured));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_rate_limited_display() {
        let err = RemoteError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
