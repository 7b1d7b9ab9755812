//! Input event router.
//!
//! Maps debounced button edges to controller actions:
//!
//! | Button       | Edge      | Action                                        |
//! |--------------|-----------|-----------------------------------------------|
//! | bond-erase   | `Pressed` | Erase every bond of the local identity        |
//! | pairing      | `Pressed` | Stop advertising (best effort), queue pairing |
//!
//! Releases and unknown buttons are ignored. The router runs on the
//! input-polling context: it may stop advertising and erase bonds, but
//! the restart is always left to the deferred worker.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::intents::AdvTrigger;
use crate::app::ports::{AdvertiserPort, BondStorePort, EventSink};
use crate::config::ControllerConfig;
use crate::deferred::IntentQueue;
use crate::drivers::button::Edge;

/// Button identifier as configured.
pub type ButtonId = u8;

/// A debounced edge on one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    pub button: ButtonId,
    pub edge: Edge,
}

/// What a button edge was turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIntent {
    EraseBonds,
    EnterPairingMode,
}

pub struct InputRouter<'q> {
    queue: &'q IntentQueue,
    identity: u8,
    bond_erase_button: ButtonId,
    pairing_button: ButtonId,
    erase_bonds_on_boot: bool,
}

impl<'q> InputRouter<'q> {
    pub fn new(queue: &'q IntentQueue, config: &ControllerConfig) -> Self {
        Self {
            queue,
            identity: config.local_identity,
            bond_erase_button: config.bond_erase_button,
            pairing_button: config.pairing_button,
            erase_bonds_on_boot: config.erase_bonds_on_boot,
        }
    }

    /// Bring-up: optionally erase all bonds, then queue the first start.
    pub fn boot(&self, store: &mut impl BondStorePort, sink: &mut impl EventSink) {
        if self.erase_bonds_on_boot {
            info!("INPUT: erasing bonds on boot");
            self.erase_bonds(store, sink);
        }
        self.queue.submit(AdvTrigger::Boot);
    }

    /// Route one debounced edge.
    pub fn on_button_edge<H>(
        &self,
        edge: ButtonEdge,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) -> Option<InputIntent>
    where
        H: AdvertiserPort + BondStorePort,
    {
        if edge.edge != Edge::Pressed {
            return None;
        }

        if edge.button == self.bond_erase_button {
            info!("INPUT: bond erase requested");
            self.erase_bonds(hw, sink);
            Some(InputIntent::EraseBonds)
        } else if edge.button == self.pairing_button {
            info!("INPUT: pairing mode requested");
            if let Err(e) = hw.stop_advertising() {
                warn!("INPUT: advertising stop failed ({}), continuing", e);
                sink.emit(&AppEvent::AdvertisingStopFailed(e));
            }
            sink.emit(&AppEvent::PairingModeRequested);
            self.queue.submit(AdvTrigger::PairingRequested);
            Some(InputIntent::EnterPairingMode)
        } else {
            None
        }
    }

    /// Queue a refresh from the bond store, e.g. after bonds changed
    /// behind the controller's back.
    pub fn request_reconnect(&self) {
        self.queue.submit(AdvTrigger::Reconnect);
    }

    // Advertising and the accept list are left as they are; the next
    // rebuild sees the empty store.
    fn erase_bonds(&self, store: &mut impl BondStorePort, sink: &mut impl EventSink) {
        match store.erase_all_bonds(self.identity) {
            Ok(()) => {
                info!("INPUT: all bonds erased");
                sink.emit(&AppEvent::BondsErased);
            }
            Err(e) => {
                error!("INPUT: bond erase failed ({})", e);
                sink.emit(&AppEvent::BondEraseFailed(e));
            }
        }
    }
}
