//! Mock radio for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history, and injects failures on demand. Behaves like a controller
//! with one advertising set and one link slot: starting while
//! advertising or while a link is up fails with `Busy`.

use bondgate::advertising::payload::AdvPayload;
use bondgate::advertising::{AdvParams, AdvertisingMode};
use bondgate::app::events::AppEvent;
use bondgate::app::ports::{AcceptListPort, AdvertiserPort, BondStorePort, EventSink};
use bondgate::bond::{BleAddress, BondList, BondRecord};
use bondgate::error::{BondStoreError, RadioError};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Start(AdvParams),
    Stop,
    AcceptListClear,
    AcceptListAdd(BleAddress),
    EnumerateBonds,
    EraseBonds,
}

// ── MockRadio ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    pub bonds: Vec<BleAddress>,
    pub advertising: Option<AdvParams>,
    pub accept_list: Vec<BleAddress>,
    pub link_up: bool,

    /// Fail the next start with this error.
    pub fail_next_start: Option<RadioError>,
    pub fail_stop: Option<RadioError>,
    pub fail_clear: Option<RadioError>,
    /// Fail the add that would become entry N (0-based).
    pub fail_add_at: Option<usize>,
    pub fail_enumerate: Option<BondStoreError>,
    pub fail_erase: Option<BondStoreError>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bonds(n: u8) -> Self {
        Self {
            bonds: (1..=n).map(addr).collect(),
            ..Self::default()
        }
    }

    pub fn starts(&self) -> Vec<AdvParams> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Start(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn start_attempts(&self) -> usize {
        self.starts().len()
    }

    pub fn advertising_mode(&self) -> Option<AdvertisingMode> {
        self.advertising.map(|p| p.mode)
    }

    pub fn count(&self, call: &RadioCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// A central connected: advertising stops implicitly.
    pub fn peer_connects(&mut self) {
        self.advertising = None;
        self.link_up = true;
    }

    /// The link slot is free again.
    pub fn link_released(&mut self) {
        self.link_up = false;
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl AdvertiserPort for MockRadio {
    fn start_advertising(
        &mut self,
        params: &AdvParams,
        _payload: &AdvPayload,
    ) -> Result<(), RadioError> {
        self.calls.push(RadioCall::Start(*params));
        if let Some(e) = self.fail_next_start.take() {
            return Err(e);
        }
        if self.advertising.is_some() || self.link_up {
            return Err(RadioError::Busy);
        }
        self.advertising = Some(*params);
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), RadioError> {
        self.calls.push(RadioCall::Stop);
        if let Some(e) = self.fail_stop {
            return Err(e);
        }
        self.advertising = None;
        Ok(())
    }
}

impl AcceptListPort for MockRadio {
    fn accept_list_clear(&mut self) -> Result<(), RadioError> {
        self.calls.push(RadioCall::AcceptListClear);
        if let Some(e) = self.fail_clear {
            return Err(e);
        }
        self.accept_list.clear();
        Ok(())
    }

    fn accept_list_add(&mut self, addr: &BleAddress) -> Result<(), RadioError> {
        self.calls.push(RadioCall::AcceptListAdd(*addr));
        if self.fail_add_at == Some(self.accept_list.len()) {
            return Err(RadioError::FilterListFull);
        }
        self.accept_list.push(*addr);
        Ok(())
    }
}

impl BondStorePort for MockRadio {
    fn enumerate_bonds(
        &mut self,
        _identity: u8,
        out: &mut BondList,
    ) -> Result<(), BondStoreError> {
        self.calls.push(RadioCall::EnumerateBonds);
        if let Some(e) = self.fail_enumerate {
            return Err(e);
        }
        for peer in &self.bonds {
            out.push(BondRecord::new(*peer))
                .map_err(|_| BondStoreError::CapacityExceeded)?;
        }
        Ok(())
    }

    fn erase_all_bonds(&mut self, _identity: u8) -> Result<(), BondStoreError> {
        self.calls.push(RadioCall::EraseBonds);
        if let Some(e) = self.fail_erase {
            return Err(e);
        }
        self.bonds.clear();
        Ok(())
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

/// Public test address with `n` as the least significant byte.
pub fn addr(n: u8) -> BleAddress {
    BleAddress::public([n, 0, 0, 0, 0, 0x10])
}
