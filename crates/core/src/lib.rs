//! Catalog Core - Shared types library.
//!
//! This crate provides the domain types used across all catalog components:
//! - `storefront` - HTTP/WebSocket server, product file store, carts
//! - `cli` - Offline maintenance of the product file
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! file access, no HTTP. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product and cart records, IDs, prices, validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
