//! Application boundary: ports, inbound notifications, outbound events.
//!
//! The domain modules ([`advertising`](crate::advertising),
//! [`connection`](crate::connection), [`input`](crate::input),
//! [`deferred`](crate::deferred)) talk to the BLE stack only through the
//! **port traits** defined in [`ports`], keeping the controller fully
//! testable without a radio.

pub mod events;
pub mod intents;
pub mod notifications;
pub mod ports;
