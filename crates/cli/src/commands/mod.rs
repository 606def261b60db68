//! Command implementations and shared store setup.

pub mod cart;
pub mod wishlist;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use basket_core::IdentityStatus;
use basket_sync::config::SyncConfig;
use basket_sync::persistence::FileSnapshotStore;
use basket_sync::remote::{HttpRemote, RemoteError, RemoteSync};
use basket_sync::{AppState, CartStore};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The cart service client could not be built.
    #[error("Remote setup failed: {0}")]
    Remote(#[from] RemoteError),

    /// The state could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Open the store and resolve the shopper's identity.
///
/// # Errors
///
/// Returns an error if the configured remote URL cannot be used.
pub async fn open_store(config: &SyncConfig) -> Result<CartStore, CommandError> {
    let (remote, status) = match &config.remote_url {
        Some(url) => (
            RemoteSync::from_service(HttpRemote::new(url.clone())?, config.remote_timeout),
            config.identity_status(),
        ),
        None => {
            if config.access_token.is_some() {
                warn!("BASKET_ACCESS_TOKEN is set without BASKET_REMOTE_URL; running as guest");
            }
            (RemoteSync::offline(), IdentityStatus::Anonymous)
        }
    };

    let store = CartStore::new(
        Arc::new(FileSnapshotStore::new(&config.snapshot_dir)),
        remote,
    );

    if let Some(report) = store.handle_identity(status).await {
        info!(
            merged = report.merged,
            failed = report.failed,
            "Guest cart merged into remote cart"
        );
    }

    Ok(store)
}

/// Print the state as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
#[allow(clippy::print_stdout)]
pub fn print_state(state: &AppState) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
