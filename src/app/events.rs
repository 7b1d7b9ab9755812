//! Outbound application events.
//!
//! The controller components emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to serial, drive a status LED.

use super::intents::AdvTrigger;
use super::notifications::StatusCode;
use crate::advertising::{AdvertisingMode, FallbackReason};
use crate::bond::BleAddress;
use crate::connection::{ConnHandle, SecurityLevel};
use crate::error::{BondStoreError, LinkError, RadioError};

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    // ── Advertising ───────────────────────────────────────────
    /// Advertising is running in `mode`.
    AdvertisingStarted {
        trigger: AdvTrigger,
        mode: AdvertisingMode,
        accept_list_len: usize,
    },
    /// The radio refused to start advertising; the next trigger retries.
    AdvertisingFailed {
        mode: AdvertisingMode,
        error: RadioError,
    },
    /// Restricted mode was not possible; Open mode is used instead.
    OpenFallback(FallbackReason),
    /// Best-effort stop before pairing mode failed.
    AdvertisingStopFailed(RadioError),

    // ── Link lifecycle ────────────────────────────────────────
    LinkUp {
        handle: ConnHandle,
        peer: BleAddress,
    },
    LinkFailed {
        status: StatusCode,
    },
    LinkDown {
        handle: ConnHandle,
        reason: u8,
    },
    /// The stack released the connection object; advertising restart queued.
    LinkRecycled,
    /// A notification broke the single-link lifecycle and was rejected.
    LinkViolation(LinkError),

    // ── Security ──────────────────────────────────────────────
    SecurityChanged {
        handle: ConnHandle,
        level: SecurityLevel,
    },
    SecurityFailed {
        handle: ConnHandle,
        level: SecurityLevel,
        status: StatusCode,
    },
    PasskeyDisplay {
        handle: ConnHandle,
        passkey: u32,
    },
    PairingCancelled {
        handle: ConnHandle,
    },

    // ── User input ────────────────────────────────────────────
    PairingModeRequested,
    BondsErased,
    BondEraseFailed(BondStoreError),
}
