//! Advertising selection flows driven through the queue and worker.

use bondgate::advertising::{AdvertisingMode, AdvertisingSelector, FallbackReason};
use bondgate::app::events::AppEvent;
use bondgate::app::intents::AdvTrigger;
use bondgate::bond::MAX_BONDS;
use bondgate::config::ControllerConfig;
use bondgate::deferred::IntentQueue;
use bondgate::deferred::worker::AdvertisingWorker;
use bondgate::drivers::button::Edge;
use bondgate::error::{AcceptListError, BondStoreError, Error, RadioError};
use bondgate::input::{ButtonEdge, InputRouter};

use crate::mock_radio::{MockRadio, RadioCall, RecordingSink, addr};

fn worker(queue: &IntentQueue) -> AdvertisingWorker<'_> {
    let selector = AdvertisingSelector::new(&ControllerConfig::default()).unwrap();
    AdvertisingWorker::new(queue, selector)
}

fn pairing_press() -> ButtonEdge {
    ButtonEdge {
        button: ControllerConfig::default().pairing_button,
        edge: Edge::Pressed,
    }
}

#[test]
fn no_bonds_advertises_open() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    let outcome = result.unwrap();
    assert_eq!(trigger, AdvTrigger::Boot);
    assert_eq!(outcome.mode, AdvertisingMode::Open);
    assert_eq!(outcome.fallback, Some(FallbackReason::NoBonds));
    assert_eq!(outcome.accept_list_len, 0);
    assert!(!radio.advertising.unwrap().filter_connections);
    assert!(sink.contains(&AppEvent::OpenFallback(FallbackReason::NoBonds)));
}

#[test]
fn three_bonds_advertise_restricted() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(3);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Restricted);
    assert_eq!(outcome.accept_list_len, 3);
    assert_eq!(outcome.fallback, None);
    assert_eq!(radio.accept_list, vec![addr(1), addr(2), addr(3)]);
    assert!(radio.advertising.unwrap().filter_connections);
    assert_eq!(w.selector().accept_list(), &[addr(1), addr(2), addr(3)]);
    assert!(sink.contains(&AppEvent::AdvertisingStarted {
        trigger: AdvTrigger::Boot,
        mode: AdvertisingMode::Restricted,
        accept_list_len: 3,
    }));
}

#[test]
fn full_bond_store_advertises_restricted() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(MAX_BONDS as u8);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Restricted);
    assert_eq!(outcome.fallback, None);
    assert_eq!(outcome.accept_list_len, MAX_BONDS);
    assert_eq!(radio.accept_list.len(), MAX_BONDS);
    assert_eq!(w.selector().accept_list().len(), MAX_BONDS);
}

#[test]
fn accept_list_is_cleared_before_rebuild() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    w.run_pending(&mut radio, &mut sink);

    let first_add = radio
        .calls
        .iter()
        .position(|c| matches!(c, RadioCall::AcceptListAdd(_)))
        .unwrap();
    let clear = radio
        .calls
        .iter()
        .position(|c| *c == RadioCall::AcceptListClear)
        .unwrap();
    assert!(clear < first_add);
}

#[test]
fn failed_add_falls_back_to_open() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio {
        fail_add_at: Some(1),
        ..MockRadio::with_bonds(3)
    };
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Open);
    let expected = AcceptListError::AddFailed {
        index: 1,
        installed: 1,
        cause: RadioError::FilterListFull,
    };
    assert_eq!(
        outcome.fallback,
        Some(FallbackReason::AcceptListUnavailable(expected))
    );
    assert!(!radio.advertising.unwrap().filter_connections);
}

#[test]
fn enumeration_failure_clears_filter_and_falls_back() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio {
        fail_enumerate: Some(BondStoreError::ReadFailed),
        accept_list: vec![addr(9)],
        ..MockRadio::with_bonds(2)
    };
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Reconnect);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Open);
    assert_eq!(
        outcome.fallback,
        Some(FallbackReason::BondStoreUnavailable(BondStoreError::ReadFailed))
    );
    assert!(radio.accept_list.is_empty());
    assert!(w.selector().accept_list().is_empty());
}

#[test]
fn start_failure_is_reported_not_retried() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio {
        fail_next_start: Some(RadioError::Code(-12)),
        ..MockRadio::with_bonds(1)
    };
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    assert_eq!(result, Err(Error::Radio(RadioError::Code(-12))));
    assert_eq!(radio.start_attempts(), 1);
    assert_eq!(w.selector().mode(), None);
    assert!(sink.contains(&AppEvent::AdvertisingFailed {
        mode: AdvertisingMode::Restricted,
        error: RadioError::Code(-12),
    }));
    assert!(w.run_pending(&mut radio, &mut sink).is_none());
}

#[test]
fn pairing_press_while_restricted_restarts_open() {
    let q = IntentQueue::new();
    let cfg = ControllerConfig::default();
    let router = InputRouter::new(&q, &cfg);
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    w.run_pending(&mut radio, &mut sink);
    assert_eq!(radio.advertising_mode(), Some(AdvertisingMode::Restricted));

    router.on_button_edge(pairing_press(), &mut radio, &mut sink);
    assert_eq!(radio.count(&RadioCall::Stop), 1);
    assert_eq!(radio.advertising, None);
    assert!(q.is_pending());

    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(trigger, AdvTrigger::PairingRequested);
    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Open);
    assert_eq!(outcome.accept_list_len, 0);
    assert!(radio.accept_list.is_empty());
    assert!(w.selector().accept_list().is_empty());
}

#[test]
fn pairing_does_not_enumerate_bonds() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::PairingRequested);
    w.run_pending(&mut radio, &mut sink);

    assert_eq!(radio.count(&RadioCall::EnumerateBonds), 0);
    assert_eq!(radio.advertising_mode(), Some(AdvertisingMode::Open));
}

#[test]
fn pairing_survives_a_later_recycle_submission() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::PairingRequested);
    q.submit(AdvTrigger::Recycled);
    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    assert_eq!(trigger, AdvTrigger::PairingRequested);
    assert_eq!(result.unwrap().mode, AdvertisingMode::Open);
    assert!(!q.pairing_latched());
}

#[test]
fn pairing_mode_ends_after_one_successful_start() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(1);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::PairingRequested);
    w.run_pending(&mut radio, &mut sink);

    // New peer pairs, link goes away, stack recycles.
    radio.peer_connects();
    radio.bonds.push(addr(7));
    radio.link_released();
    q.submit(AdvTrigger::Recycled);

    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(trigger, AdvTrigger::Recycled);
    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Restricted);
    assert_eq!(outcome.accept_list_len, 2);
}

#[test]
fn pairing_start_failure_keeps_pairing_pending() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(1);
    let mut sink = RecordingSink::new();

    // A link is up, so the start is refused.
    radio.peer_connects();
    q.submit(AdvTrigger::PairingRequested);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(result, Err(Error::Radio(RadioError::Busy)));
    assert!(q.pairing_latched());

    // The link is recycled: the restart is still a pairing start.
    radio.link_released();
    q.submit(AdvTrigger::Recycled);
    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(trigger, AdvTrigger::PairingRequested);
    assert_eq!(result.unwrap().mode, AdvertisingMode::Open);
    assert!(!q.pairing_latched());
}

#[test]
fn bond_erase_then_recycle_advertises_open() {
    let q = IntentQueue::new();
    let cfg = ControllerConfig::default();
    let router = InputRouter::new(&q, &cfg);
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    w.run_pending(&mut radio, &mut sink);
    radio.clear_calls();

    let erase = ButtonEdge {
        button: cfg.bond_erase_button,
        edge: Edge::Pressed,
    };
    router.on_button_edge(erase, &mut radio, &mut sink);
    assert_eq!(radio.calls, vec![RadioCall::EraseBonds]);
    assert_eq!(radio.advertising_mode(), Some(AdvertisingMode::Restricted));

    radio.peer_connects();
    radio.link_released();
    q.submit(AdvTrigger::Recycled);
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(result.unwrap().fallback, Some(FallbackReason::NoBonds));
}

#[test]
fn boot_with_erase_on_boot_starts_open() {
    let q = IntentQueue::new();
    let cfg = ControllerConfig {
        erase_bonds_on_boot: true,
        ..ControllerConfig::default()
    };
    let router = InputRouter::new(&q, &cfg);
    let selector = AdvertisingSelector::new(&cfg).unwrap();
    let mut w = AdvertisingWorker::new(&q, selector);
    let mut radio = MockRadio::with_bonds(3);
    let mut sink = RecordingSink::new();

    router.boot(&mut radio, &mut sink);
    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();

    assert_eq!(trigger, AdvTrigger::Boot);
    assert_eq!(result.unwrap().mode, AdvertisingMode::Open);
    assert!(sink.contains(&AppEvent::BondsErased));
}

#[test]
fn async_next_services_pending_trigger() {
    let q = IntentQueue::new();
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(1);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Reconnect);
    let (trigger, result) =
        futures_lite::future::block_on(w.next(&mut radio, &mut sink));

    assert_eq!(trigger, AdvTrigger::Reconnect);
    assert_eq!(result.unwrap().mode, AdvertisingMode::Restricted);
}
