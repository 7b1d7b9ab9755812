//! Bond store view: read-only view of previously bonded peers.
//!
//! Persistence itself belongs to the stack (settings/NVS); the controller
//! only enumerates identities through [`BondStorePort`] and may request a
//! bulk erase. Enumeration results are collected into a fixed-capacity
//! [`BondList`] so the advertising worker never allocates.

use core::fmt;

use heapless::Vec;
use log::{info, warn};

use crate::app::ports::BondStorePort;
use crate::error::BondStoreError;

/// Maximum number of bonds tracked (and accept-list entries installed).
/// Matches Bluedroid's default `CONFIG_BT_SMP_MAX_BONDS`, so a full
/// bond store still fits the accept list.
pub const MAX_BONDS: usize = 15;

/// Bond enumeration result, in the order the store reported them.
pub type BondList = Vec<BondRecord, MAX_BONDS>;

/// Address type tag carried with every peer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Public,
    RandomStatic,
    RandomResolvable,
    RandomNonResolvable,
}

impl AddressKind {
    /// Classify a random address by the two most significant bits of its
    /// most significant byte (`bytes[5]`, little-endian storage).
    pub fn classify_random(bytes: &[u8; 6]) -> Self {
        match bytes[5] >> 6 {
            0b11 => Self::RandomStatic,
            0b01 => Self::RandomResolvable,
            _ => Self::RandomNonResolvable,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::RandomStatic | Self::RandomResolvable | Self::RandomNonResolvable => "random",
        }
    }
}

/// A BLE device address: six bytes in little-endian order plus type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BleAddress {
    pub kind: AddressKind,
    pub bytes: [u8; 6],
}

impl BleAddress {
    pub const fn public(bytes: [u8; 6]) -> Self {
        Self {
            kind: AddressKind::Public,
            bytes,
        }
    }

    pub fn random(bytes: [u8; 6]) -> Self {
        Self {
            kind: AddressKind::classify_random(&bytes),
            bytes,
        }
    }

    /// Whether this address can be resolved only with an IRK.
    pub fn is_resolvable(&self) -> bool {
        self.kind == AddressKind::RandomResolvable
    }
}

/// Rendered most-significant byte first, `AA:BB:CC:DD:EE:FF (public)`.
impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X} ({})",
            b[5],
            b[4],
            b[3],
            b[2],
            b[1],
            b[0],
            self.kind.label()
        )
    }
}

/// One persisted bond, reduced to the identity the accept list needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondRecord {
    pub peer: BleAddress,
}

impl BondRecord {
    pub const fn new(peer: BleAddress) -> Self {
        Self { peer }
    }
}

/// Enumerate every bond for `identity`.
///
/// Returns the store's error unchanged; the selector treats any failure
/// the same as an empty list.
pub fn load_bonds(
    store: &mut impl BondStorePort,
    identity: u8,
) -> Result<BondList, BondStoreError> {
    let mut bonds = BondList::new();
    match store.enumerate_bonds(identity, &mut bonds) {
        Ok(()) => {
            info!("BOND: {} bonded peer(s) for identity {}", bonds.len(), identity);
            Ok(bonds)
        }
        Err(e) => {
            warn!("BOND: enumeration failed for identity {}: {}", identity, e);
            Err(e)
        }
    }
}
