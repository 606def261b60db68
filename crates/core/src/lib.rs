//! Basket Core - Shared cart and wishlist types.
//!
//! This crate provides the types shared by every Basket component:
//! - `sync` - The cart/wishlist synchronization store
//! - `cli` - Command-line driver for the store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Origin-tagged IDs, prices, cart lines, wishlist entries,
//!   identity signal and orchestrator phases

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
