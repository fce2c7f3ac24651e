//! Catalog server library.
//!
//! Product file store, catalog manager, live change broadcaster, cart
//! registry and the HTTP/WebSocket surface over them. The binary in
//! `main.rs` only wires configuration, observability and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod broadcast;
pub mod carts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod state;
pub mod store;
