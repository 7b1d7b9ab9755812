//! Unified error types for the advertising controller.
//!
//! A single `Error` enum that every component converts into, keeping the
//! worker's and the notification handlers' error handling uniform.
//! All variants are `Copy` so they travel through events and logs
//! without allocation.
//!
//! None of these errors is fatal: the selector degrades every failure on
//! the advertising path to Open (connectable, unfiltered) advertising.

use core::fmt;

use crate::connection::ConnHandle;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The radio rejected a start/stop or accept-list operation.
    Radio(RadioError),
    /// Bond enumeration or erase failed.
    BondStore(BondStoreError),
    /// The accept list could not be rebuilt from the bond snapshot.
    AcceptList(AcceptListError),
    /// A stack notification violated the single-link lifecycle.
    Link(LinkError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::BondStore(e) => write!(f, "bond store: {e}"),
            Self::AcceptList(e) => write!(f, "accept list: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

/// Errors reported by the radio for advertising and filter-list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The controller is busy (advertising already active, link in use).
    Busy,
    /// The parameter set or payload was rejected.
    InvalidParams,
    /// The radio's filter accept list has no room for another entry.
    FilterListFull,
    /// The stack is not enabled yet.
    NotReady,
    /// Any other stack error code, passed through verbatim.
    Code(i32),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "radio busy"),
            Self::InvalidParams => write!(f, "invalid parameters"),
            Self::FilterListFull => write!(f, "filter accept list full"),
            Self::NotReady => write!(f, "stack not ready"),
            Self::Code(code) => write!(f, "stack error {code}"),
        }
    }
}

impl core::error::Error for RadioError {}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Bond store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStoreError {
    /// Persistent storage could not be read.
    ReadFailed,
    /// The store holds more bonds than the controller can track.
    CapacityExceeded,
    /// The bulk erase did not complete.
    EraseFailed,
    /// Any other stack error code.
    Code(i32),
}

impl fmt::Display for BondStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::CapacityExceeded => write!(f, "more bonds than capacity"),
            Self::EraseFailed => write!(f, "erase failed"),
            Self::Code(code) => write!(f, "stack error {code}"),
        }
    }
}

impl core::error::Error for BondStoreError {}

impl From<BondStoreError> for Error {
    fn from(e: BondStoreError) -> Self {
        Self::BondStore(e)
    }
}

// ---------------------------------------------------------------------------
// Accept-list errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptListError {
    /// Clearing the radio filter failed; nothing was installed.
    ClearFailed(RadioError),
    /// Adding the bond at `index` failed after `installed` entries went in.
    AddFailed {
        index: usize,
        installed: usize,
        cause: RadioError,
    },
}

impl fmt::Display for AcceptListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearFailed(cause) => write!(f, "clear failed ({cause})"),
            Self::AddFailed {
                index,
                installed,
                cause,
            } => write!(
                f,
                "add of bond #{index} failed ({cause}), {installed} installed"
            ),
        }
    }
}

impl core::error::Error for AcceptListError {}

impl From<AcceptListError> for Error {
    fn from(e: AcceptListError) -> Self {
        Self::AcceptList(e)
    }
}

// ---------------------------------------------------------------------------
// Link lifecycle errors
// ---------------------------------------------------------------------------

/// Lifecycle violations. These are programming-invariant failures in the
/// stack glue and are rejected, never acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The notification references a handle that was already released.
    StaleHandle(ConnHandle),
    /// The notification references a handle the tracker never saw.
    UnknownHandle(ConnHandle),
    /// A second link came up while one is still owned.
    AlreadyConnected {
        active: ConnHandle,
        incoming: ConnHandle,
    },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle(h) => write!(f, "stale handle {h}"),
            Self::UnknownHandle(h) => write!(f, "unknown handle {h}"),
            Self::AlreadyConnected { active, incoming } => {
                write!(f, "link {incoming} while {active} still active")
            }
        }
    }
}

impl core::error::Error for LinkError {}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The advertising payload does not fit in a legacy PDU.
    PayloadTooLarge,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::PayloadTooLarge => write!(f, "advertising payload too large"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
