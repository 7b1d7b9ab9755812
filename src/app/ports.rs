//! Port traits: the hexagonal boundary between the controller and the BLE stack.
//!
//! ```text
//!   Stack adapter ──▶ Port trait ──▶ Selector / Router (domain)
//! ```
//!
//! The radio adapter implements every capability trait; the domain takes
//! them as generics at the call site, so the controller never touches the
//! stack directly and runs unchanged against the host-side mocks.
//!
//! ## Context rules
//!
//! - [`AcceptListPort`] and [`AdvertiserPort::start_advertising`] are only
//!   ever called from the deferred-work context.
//! - [`AdvertiserPort::stop_advertising`] and
//!   [`BondStorePort::erase_all_bonds`] are called from the input context.
//! - Nothing here is called from the stack's own notification context.

use crate::advertising::payload::AdvPayload;
use crate::advertising::AdvParams;
use crate::bond::{BleAddress, BondList};
use crate::error::{BondStoreError, RadioError};

// ───────────────────────────────────────────────────────────────
// Advertiser port (domain → radio)
// ───────────────────────────────────────────────────────────────

/// Start/stop legacy connectable advertising.
pub trait AdvertiserPort {
    /// Start advertising with `params`. Fails with [`RadioError::Busy`]
    /// if advertising is already running or the link slot is taken.
    fn start_advertising(
        &mut self,
        params: &AdvParams,
        payload: &AdvPayload,
    ) -> Result<(), RadioError>;

    /// Stop advertising. Stopping when nothing runs is not an error on
    /// every stack; callers treat the result as best-effort.
    fn stop_advertising(&mut self) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Accept-list port (domain → radio connection filter)
// ───────────────────────────────────────────────────────────────

/// Radio-level filter accept list.
pub trait AcceptListPort {
    /// Remove every entry. Clearing an empty list succeeds.
    fn accept_list_clear(&mut self) -> Result<(), RadioError>;

    /// Add one peer identity.
    fn accept_list_add(&mut self, addr: &BleAddress) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Bond store port (domain ↔ persisted bonds)
// ───────────────────────────────────────────────────────────────

/// Read-only enumeration of persisted bonds plus bulk erase.
pub trait BondStorePort {
    /// Append every bond of `identity` to `out`, in store order.
    /// Implementations return [`BondStoreError::CapacityExceeded`] when
    /// `out` fills up rather than silently truncating.
    fn enumerate_bonds(
        &mut self,
        identity: u8,
        out: &mut BondList,
    ) -> Result<(), BondStoreError>;

    /// Erase every bond of `identity`.
    fn erase_all_bonds(&mut self, identity: u8) -> Result<(), BondStoreError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
