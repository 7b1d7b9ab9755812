//! Advertising mode selector.
//!
//! Decides between **Open** advertising (connectable and unfiltered, for
//! first pairing) and **Restricted** advertising (connectable, accept-list
//! filtered, for reconnection of bonded peers), rebuilds the accept list
//! from the bond store when needed, and issues the start.
//!
//! ```text
//!  trigger ──▶ pairing? ──yes──▶ clear accept list ──▶ Open
//!                 │
//!                 no
//!                 ▼
//!          enumerate bonds ──err──▶ clear accept list ──▶ Open
//!                 │
//!                 ▼
//!          rebuild accept list ──err──▶ Open
//!                 │
//!          0 ─────┴───── n > 0
//!          ▼             ▼
//!        Open        Restricted
//! ```
//!
//! The selector only ever starts advertising. Stopping is implicit on
//! connection establishment, or done best-effort by the input router.
//! Start failures are reported and logged, never retried here: the next
//! natural trigger (usually the next recycle) tries again.

pub mod payload;

use log::{info, warn};

use crate::accept_list::AcceptListManager;
use crate::app::events::AppEvent;
use crate::app::intents::AdvTrigger;
use crate::app::ports::{AcceptListPort, AdvertiserPort, BondStorePort, EventSink};
use crate::bond::{self, BleAddress};
use crate::config::ControllerConfig;
use crate::error::{AcceptListError, BondStoreError, ConfigError, Result};

use payload::AdvPayload;

/// Which advertising flavour is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvertisingMode {
    /// Connectable and unfiltered; any peer may connect and pair.
    Open,
    /// Connectable, but only accept-listed peers may connect.
    Restricted,
}

/// Why the selector advertised openly instead of with the accept list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No bonds yet; first pairing must be possible.
    NoBonds,
    /// Bond enumeration failed.
    BondStoreUnavailable(BondStoreError),
    /// The accept list could not be (fully) installed.
    AcceptListUnavailable(AcceptListError),
}

/// Legacy advertising parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvParams {
    pub mode: AdvertisingMode,
    /// Minimum interval in 0.625 ms units.
    pub interval_min: u16,
    /// Maximum interval in 0.625 ms units.
    pub interval_max: u16,
    /// Only accept-listed peers may connect.
    pub filter_connections: bool,
    /// Only accept-listed peers get scan responses.
    pub filter_scan_requests: bool,
}

impl AdvParams {
    /// Connectable, unfiltered.
    pub fn open(config: &ControllerConfig) -> Self {
        Self {
            mode: AdvertisingMode::Open,
            interval_min: config.adv_interval_min,
            interval_max: config.adv_interval_max,
            filter_connections: false,
            filter_scan_requests: false,
        }
    }

    /// Connectable, connection requests filtered by the accept list.
    pub fn restricted(config: &ControllerConfig) -> Self {
        Self {
            mode: AdvertisingMode::Restricted,
            interval_min: config.adv_interval_min,
            interval_max: config.adv_interval_max,
            filter_connections: true,
            filter_scan_requests: config.filter_scan_requests,
        }
    }
}

/// Result of a successful start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvOutcome {
    pub trigger: AdvTrigger,
    pub mode: AdvertisingMode,
    pub accept_list_len: usize,
    pub fallback: Option<FallbackReason>,
}

/// Owns the accept list snapshot and the parameter sets. Lives on the
/// deferred-work context; nothing else writes to it.
pub struct AdvertisingSelector {
    identity: u8,
    open: AdvParams,
    restricted: AdvParams,
    payload: AdvPayload,
    accept_list: AcceptListManager,
    mode: Option<AdvertisingMode>,
}

impl AdvertisingSelector {
    pub fn new(config: &ControllerConfig) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            identity: config.local_identity,
            open: AdvParams::open(config),
            restricted: AdvParams::restricted(config),
            payload: AdvPayload::build(&config.device_name, config.service_uuid)?,
            accept_list: AcceptListManager::new(),
            mode: None,
        })
    }

    /// Pick the advertising mode for `trigger` and start advertising.
    pub fn select_and_start<H>(
        &mut self,
        trigger: AdvTrigger,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) -> Result<AdvOutcome>
    where
        H: AdvertiserPort + AcceptListPort + BondStorePort,
    {
        if trigger.is_pairing() {
            match self.accept_list.clear(hw) {
                Ok(()) => info!("ADV: accept list cleared for pairing"),
                Err(e) => warn!("ADV: accept list clear failed ({}), pairing anyway", e),
            }
            return self.start(trigger, AdvertisingMode::Open, None, hw, sink);
        }

        let bonds = match bond::load_bonds(hw, self.identity) {
            Ok(bonds) => bonds,
            Err(e) => {
                if let Err(ce) = self.accept_list.clear(hw) {
                    warn!("ADV: accept list clear failed ({})", ce);
                }
                let fallback = Some(FallbackReason::BondStoreUnavailable(e));
                return self.start(trigger, AdvertisingMode::Open, fallback, hw, sink);
            }
        };

        match self.accept_list.rebuild(hw, &bonds) {
            Ok(0) => {
                let fallback = Some(FallbackReason::NoBonds);
                self.start(trigger, AdvertisingMode::Open, fallback, hw, sink)
            }
            Ok(_) => self.start(trigger, AdvertisingMode::Restricted, None, hw, sink),
            Err(e) => {
                let fallback = Some(FallbackReason::AcceptListUnavailable(e));
                self.start(trigger, AdvertisingMode::Open, fallback, hw, sink)
            }
        }
    }

    /// Mode of the most recent successful start; `None` before the first
    /// start or after a failed one.
    pub fn mode(&self) -> Option<AdvertisingMode> {
        self.mode
    }

    /// Current accept list snapshot.
    pub fn accept_list(&self) -> &[BleAddress] {
        self.accept_list.entries()
    }

    pub fn params(&self, mode: AdvertisingMode) -> &AdvParams {
        match mode {
            AdvertisingMode::Open => &self.open,
            AdvertisingMode::Restricted => &self.restricted,
        }
    }

    pub fn payload(&self) -> &AdvPayload {
        &self.payload
    }

    // ── Internal ──────────────────────────────────────────────

    fn start(
        &mut self,
        trigger: AdvTrigger,
        mode: AdvertisingMode,
        fallback: Option<FallbackReason>,
        hw: &mut impl AdvertiserPort,
        sink: &mut impl EventSink,
    ) -> Result<AdvOutcome> {
        debug_assert!(
            mode == AdvertisingMode::Open || !self.accept_list.is_empty(),
            "Restricted advertising with an empty accept list"
        );

        if let Some(reason) = fallback {
            match reason {
                FallbackReason::NoBonds => info!("ADV: no bonded devices, advertising openly"),
                _ => warn!("ADV: falling back to open advertising ({:?})", reason),
            }
            sink.emit(&AppEvent::OpenFallback(reason));
        }

        let accept_list_len = self.accept_list.len();
        if let Err(error) = hw.start_advertising(self.params(mode), &self.payload) {
            self.mode = None;
            warn!("ADV: start failed in {:?} mode ({})", mode, error);
            sink.emit(&AppEvent::AdvertisingFailed { mode, error });
            return Err(error.into());
        }

        self.mode = Some(mode);
        match mode {
            AdvertisingMode::Open => info!("ADV: started open ({:?})", trigger),
            AdvertisingMode::Restricted => info!(
                "ADV: started with accept list, {} bonded device(s) ({:?})",
                accept_list_len, trigger
            ),
        }
        sink.emit(&AppEvent::AdvertisingStarted {
            trigger,
            mode,
            accept_list_len,
        });

        Ok(AdvOutcome {
            trigger,
            mode,
            accept_list_len,
            fallback,
        })
    }
}
