//! Bondgate: accept-list-gated BLE advertising and bonding controller.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by the `espidf` feature within each
//! module; without it the radio adapter runs an in-memory simulation.

#![deny(unused_must_use)]

pub mod accept_list;
pub mod adapters;
pub mod advertising;
pub mod app;
pub mod bond;
pub mod config;
pub mod connection;
pub mod deferred;
pub mod drivers;
pub mod error;
pub mod input;
