//! Notifications produced by the BLE stack and consumed by the
//! [`ConnectionTracker`](crate::connection::ConnectionTracker).
//!
//! The stack adapter translates its native callbacks into these values
//! and hands them over from the stack's own callback context. Handlers
//! must stay non-blocking and must never call advertising control.

use crate::bond::BleAddress;
use crate::connection::{ConnHandle, SecurityLevel};

/// HCI status / SMP error code; zero is success.
pub type StatusCode = u8;

/// Status value meaning "no error".
pub const STATUS_SUCCESS: StatusCode = 0;

/// Stack callbacks relevant to advertising control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackNotification {
    /// A link attempt completed; `status != 0` means it failed and no
    /// handle was acquired.
    Connected {
        handle: ConnHandle,
        peer: BleAddress,
        status: StatusCode,
    },
    /// The link went down. The connection object may still be in use by
    /// the stack until [`Recycled`](Self::Recycled) arrives.
    Disconnected { handle: ConnHandle, reason: u8 },
    /// The stack released the connection object.
    Recycled,
    /// Encryption / authentication finished (or failed).
    SecurityChanged {
        handle: ConnHandle,
        level: SecurityLevel,
        status: StatusCode,
    },
    /// Passkey the user must type on the peer.
    PasskeyDisplay { handle: ConnHandle, passkey: u32 },
    /// The peer cancelled pairing.
    PairingCancelled { handle: ConnHandle },
}
