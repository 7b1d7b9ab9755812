//! Deferred advertising work.
//!
//! Stack callbacks and the input loop must never touch advertising
//! control directly. They post an [`AdvTrigger`] to the shared
//! [`IntentQueue`]; the [`AdvertisingWorker`](worker::AdvertisingWorker),
//! running on its own thread, drains it and is the only code that
//! rewrites the accept list or starts advertising.
//!
//! ```text
//! ┌─────────────┐  submit   ┌──────────────┐  wait/try_take  ┌────────┐
//! │ stack cb    │──────────▶│ IntentQueue  │────────────────▶│ worker │
//! │ input loop  │           │ (1 slot)     │                 │ thread │
//! └─────────────┘           └──────────────┘                 └────────┘
//! ```
//!
//! The slot is an `embassy-sync` [`Signal`]: a newer trigger overwrites
//! an unserviced older one, and taking is atomic with respect to new
//! submissions, so a trigger posted while the worker runs is kept for
//! the next run.
//!
//! Pairing requests additionally set a latch that survives coalescing.
//! While the latch is set every run is a pairing run; it is released
//! only by a successful pairing start.

pub mod task;
pub mod worker;

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::app::intents::AdvTrigger;

/// Submission counters, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Triggers posted since start.
    pub submitted: u32,
    /// Triggers that replaced an unserviced one.
    pub coalesced: u32,
}

/// Single-slot, latest-wins trigger queue.
pub struct IntentQueue {
    slot: Signal<CriticalSectionRawMutex, AdvTrigger>,
    pairing: AtomicBool,
    submitted: AtomicU32,
    coalesced: AtomicU32,
}

impl IntentQueue {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
            pairing: AtomicBool::new(false),
            submitted: AtomicU32::new(0),
            coalesced: AtomicU32::new(0),
        }
    }

    /// Post a trigger. Safe from any context, never blocks, never calls
    /// into the radio.
    pub fn submit(&self, trigger: AdvTrigger) {
        if trigger.is_pairing() {
            self.pairing.store(true, Ordering::Release);
        }
        if self.slot.signaled() {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.slot.signal(trigger);
    }

    /// Take the pending trigger, if any.
    pub fn try_take(&self) -> Option<AdvTrigger> {
        self.slot.try_take()
    }

    /// Wait until a trigger is pending and take it.
    pub async fn wait(&self) -> AdvTrigger {
        self.slot.wait().await
    }

    pub fn is_pending(&self) -> bool {
        self.slot.signaled()
    }

    /// Whether a pairing request is still unserviced.
    pub fn pairing_latched(&self) -> bool {
        self.pairing.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn take_pairing_latch(&self) -> bool {
        self.pairing.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn rearm_pairing_latch(&self) {
        self.pairing.store(true, Ordering::Release);
    }
}

impl Default for IntentQueue {
    fn default() -> Self {
        Self::new()
    }
}
