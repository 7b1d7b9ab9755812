//! Accept list manager.
//!
//! Keeps the radio's filter accept list and a local snapshot of it in
//! lock-step with the latest bond enumeration. The snapshot only ever
//! holds entries the radio acknowledged, in installation order, without
//! duplicates.
//!
//! A failed rebuild leaves the snapshot holding the partial set the radio
//! accepted and returns an error; callers must not advertise with
//! filtering on the strength of a partial list.

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::AcceptListPort;
use crate::bond::{BleAddress, BondRecord, MAX_BONDS};
use crate::error::{AcceptListError, RadioError};

/// Local mirror of the radio filter accept list.
#[derive(Debug, Default)]
pub struct AcceptListManager {
    entries: Vec<BleAddress, MAX_BONDS>,
}

impl AcceptListManager {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Clear the radio list, then install every distinct bond address.
    ///
    /// Returns the number of entries installed; zero is a valid result.
    pub fn rebuild(
        &mut self,
        radio: &mut impl AcceptListPort,
        bonds: &[BondRecord],
    ) -> Result<usize, AcceptListError> {
        self.entries.clear();
        radio
            .accept_list_clear()
            .map_err(AcceptListError::ClearFailed)?;

        for (index, bond) in bonds.iter().enumerate() {
            if self.entries.contains(&bond.peer) {
                debug!("ACL: duplicate bond {} skipped", bond.peer);
                continue;
            }
            if let Err(cause) = radio.accept_list_add(&bond.peer) {
                warn!("ACL: failed to add {} ({})", bond.peer, cause);
                return Err(AcceptListError::AddFailed {
                    index,
                    installed: self.entries.len(),
                    cause,
                });
            }
            // Bond lists and the snapshot share MAX_BONDS capacity.
            if self.entries.push(bond.peer).is_err() {
                return Err(AcceptListError::AddFailed {
                    index,
                    installed: self.entries.len(),
                    cause: RadioError::FilterListFull,
                });
            }
            info!("ACL: added {}", bond.peer);
        }

        Ok(self.entries.len())
    }

    /// Empty the radio list for pairing mode. The local snapshot is
    /// emptied even if the radio call fails, since Open advertising does
    /// not consult the filter.
    pub fn clear(&mut self, radio: &mut impl AcceptListPort) -> Result<(), RadioError> {
        self.entries.clear();
        radio.accept_list_clear()
    }

    pub fn entries(&self) -> &[BleAddress] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
