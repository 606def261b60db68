//! Basket cart/wishlist synchronization store.
//!
//! Decides where the authoritative copy of a shopper's cart and wishlist
//! lives and reconciles local and remote copies when that changes.
//!
//! # Architecture
//!
//! - [`transition`] - Pure `(state, action) -> state` function; the only place
//!   collection invariants are enforced
//! - [`persistence`] - Device-scoped snapshot used while the shopper is anonymous
//! - [`remote`] - Remote cart/wishlist service traits and the HTTP client
//! - [`orchestrator`] - Identity-driven routing and the merge-on-sign-in protocol
//! - [`store`] - [`CartStore`], the only surface collaborators call
//!
//! # Example
//!
//! ```rust,ignore
//! use basket_sync::{CartStore, persistence::FileSnapshotStore, remote::{HttpRemote, RemoteSync}};
//!
//! let remote = RemoteSync::from_service(HttpRemote::new(base_url)?, config.remote_timeout);
//! let store = CartStore::new(FileSnapshotStore::new(&config.snapshot_dir), remote);
//!
//! tokio::spawn({
//!     let store = store.clone();
//!     async move { store.drive(identity_rx).await }
//! });
//!
//! store.add_to_cart(draft).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod persistence;
pub mod remote;
pub mod state;
pub mod store;
pub mod transition;

pub use error::{Result, StoreError};
pub use orchestrator::MergeReport;
pub use state::AppState;
pub use store::CartStore;
pub use transition::Action;
