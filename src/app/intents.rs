//! Inbound intents for the advertising worker.
//!
//! Every request to (re)start advertising is expressed as an
//! [`AdvTrigger`] and posted to the [`IntentQueue`](crate::deferred::IntentQueue).
//! The queue holds at most one; a newer trigger replaces an older one.

/// Why advertising needs to (re)start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvTrigger {
    /// First start after the stack came up and settings were loaded.
    Boot,
    /// Application-requested refresh (e.g. after an external bond change).
    Reconnect,
    /// The user asked for pairing mode.
    PairingRequested,
    /// The stack released the previous connection object.
    Recycled,
}

/// The two things the worker can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Clear the accept list and advertise openly.
    StartPairingAdvertising,
    /// Rebuild the accept list from bonds and pick the mode.
    StartNormalAdvertising,
}

impl AdvTrigger {
    pub const fn kind(self) -> IntentKind {
        match self {
            Self::PairingRequested => IntentKind::StartPairingAdvertising,
            Self::Boot | Self::Reconnect | Self::Recycled => IntentKind::StartNormalAdvertising,
        }
    }

    pub const fn is_pairing(self) -> bool {
        matches!(self.kind(), IntentKind::StartPairingAdvertising)
    }
}
