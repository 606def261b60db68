//! Unified error handling with Sentry integration.
//!
//! [`StoreError`] is what the public operations return. Failures in background
//! reconciliation (cold-start fetch, snapshot reads, merge lines) never reach a
//! caller; they go through [`report_background_error`] instead.

use thiserror::Error;

use basket_core::{CartLineId, WishlistEntryId};

use crate::remote::RemoteError;

/// Error returned by [`crate::CartStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote cart/wishlist service rejected or failed the call.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The identity signal has not resolved yet.
    #[error("Store not ready: identity is still resolving")]
    NotReady,

    /// No cart line with this ID.
    #[error("Cart line not found: {0}")]
    LineNotFound(CartLineId),

    /// No wishlist entry with this ID.
    #[error("Wishlist entry not found: {0}")]
    EntryNotFound(WishlistEntryId),
}

impl StoreError {
    /// Whether retrying the same call later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Remote(err) => err.is_transient(),
            Self::NotReady => true,
            Self::LineNotFound(_) | Self::EntryNotFound(_) => false,
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Log and capture an error that is deliberately not propagated.
///
/// Used for cold-start fetch failures, unreadable snapshots and merge lines
/// that failed to push.
pub fn report_background_error<E>(context: &str, error: &E)
where
    E: std::error::Error + ?Sized,
{
    let event_id = sentry::capture_error(error);
    tracing::warn!(
        error = %error,
        context,
        sentry_event_id = %event_id,
        "Background sync error"
    );
}

/// Add a breadcrumb for a shopper action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// wishlist mutations leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "tee")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
