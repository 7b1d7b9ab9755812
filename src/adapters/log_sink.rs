//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC on device, stderr on the host). One line
//! per event, tagged by subsystem.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::AdvertisingStarted {
                trigger,
                mode,
                accept_list_len,
            } => {
                info!(
                    "ADV | started | mode={:?} trigger={:?} accept_list={}",
                    mode, trigger, accept_list_len
                );
            }
            AppEvent::AdvertisingFailed { mode, error } => {
                warn!("ADV | start failed | mode={:?} err={}", mode, error);
            }
            AppEvent::OpenFallback(reason) => {
                info!("ADV | open fallback | reason={:?}", reason);
            }
            AppEvent::AdvertisingStopFailed(e) => {
                warn!("ADV | stop failed | err={}", e);
            }
            AppEvent::LinkUp { handle, peer } => {
                info!("LINK | up | {} peer={}", handle, peer);
            }
            AppEvent::LinkFailed { status } => {
                warn!("LINK | failed | status=0x{:02x}", status);
            }
            AppEvent::LinkDown { handle, reason } => {
                info!("LINK | down | {} reason=0x{:02x}", handle, reason);
            }
            AppEvent::LinkRecycled => {
                info!("LINK | recycled");
            }
            AppEvent::LinkViolation(e) => {
                error!("LINK | violation | {}", e);
            }
            AppEvent::SecurityChanged { handle, level } => {
                info!("SEC | changed | {} level={}", handle, level);
            }
            AppEvent::SecurityFailed {
                handle,
                level,
                status,
            } => {
                warn!(
                    "SEC | failed | {} level={} err=0x{:02x}",
                    handle, level, status
                );
            }
            AppEvent::PasskeyDisplay { handle, passkey } => {
                info!("SEC | passkey | {} {:06}", handle, passkey);
            }
            AppEvent::PairingCancelled { handle } => {
                info!("SEC | pairing cancelled | {}", handle);
            }
            AppEvent::PairingModeRequested => {
                info!("INPUT | pairing mode requested");
            }
            AppEvent::BondsErased => {
                info!("BOND | all erased");
            }
            AppEvent::BondEraseFailed(e) => {
                error!("BOND | erase failed | err={}", e);
            }
        }
    }
}
