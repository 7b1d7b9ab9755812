//! Advertising worker: drains the [`IntentQueue`] and runs the selector.
//!
//! The worker owns the [`AdvertisingSelector`] (and through it the
//! accept list snapshot), so advertising reconfiguration is serialised
//! by construction: there is exactly one worker and nothing else holds a
//! selector.

use log::{debug, info};

use super::IntentQueue;
use crate::advertising::{AdvOutcome, AdvertisingSelector};
use crate::app::intents::AdvTrigger;
use crate::app::ports::{AcceptListPort, AdvertiserPort, BondStorePort, EventSink};
use crate::error::Result;

/// One executed trigger and what came of it.
pub type Execution = (AdvTrigger, Result<AdvOutcome>);

pub struct AdvertisingWorker<'q> {
    queue: &'q IntentQueue,
    selector: AdvertisingSelector,
}

impl<'q> AdvertisingWorker<'q> {
    pub fn new(queue: &'q IntentQueue, selector: AdvertisingSelector) -> Self {
        Self { queue, selector }
    }

    /// Run the pending trigger, if any, without waiting.
    pub fn run_pending<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Option<Execution>
    where
        H: AdvertiserPort + AcceptListPort + BondStorePort,
    {
        let submitted = self.queue.try_take()?;
        self.execute(submitted, hw, sink)
    }

    /// Wait for the next trigger and run it.
    pub async fn next<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Execution
    where
        H: AdvertiserPort + AcceptListPort + BondStorePort,
    {
        loop {
            let submitted = self.queue.wait().await;
            if let Some(execution) = self.execute(submitted, hw, sink) {
                return execution;
            }
        }
    }

    /// Service triggers forever.
    pub async fn run<H>(mut self, hw: &mut H, sink: &mut impl EventSink)
    where
        H: AdvertiserPort + AcceptListPort + BondStorePort,
    {
        info!("DEFER: advertising worker running");
        loop {
            let _ = self.next(hw, sink).await;
        }
    }

    pub fn selector(&self) -> &AdvertisingSelector {
        &self.selector
    }

    fn execute<H>(
        &mut self,
        submitted: AdvTrigger,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) -> Option<Execution>
    where
        H: AdvertiserPort + AcceptListPort + BondStorePort,
    {
        let trigger = if self.queue.take_pairing_latch() {
            AdvTrigger::PairingRequested
        } else if submitted.is_pairing() {
            // Latch already consumed by an earlier successful run.
            debug!("DEFER: pairing request already serviced");
            return None;
        } else {
            submitted
        };

        if trigger != submitted {
            debug!("DEFER: {:?} promoted to pairing", submitted);
        }

        let result = self.selector.select_and_start(trigger, hw, sink);
        if trigger.is_pairing() && result.is_err() {
            self.queue.rearm_pairing_latch();
        }
        Some((trigger, result))
    }
}
