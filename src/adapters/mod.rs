//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                        |
//! |------------|------------------|------------------------------------|
//! | `radio`    | AdvertiserPort   | Bluedroid GAP / in-memory sim      |
//! |            | AcceptListPort   | Controller filter accept list      |
//! |            | BondStorePort    | Bluedroid bond database            |
//! | `log_sink` | EventSink        | Serial log output                  |

pub mod log_sink;
pub mod radio;
