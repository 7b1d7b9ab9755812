//! Connection lifecycle driving advertising restarts.

use bondgate::advertising::{AdvertisingMode, AdvertisingSelector};
use bondgate::app::events::AppEvent;
use bondgate::app::intents::AdvTrigger;
use bondgate::app::notifications::{STATUS_SUCCESS, StackNotification};
use bondgate::config::ControllerConfig;
use bondgate::connection::{ConnHandle, ConnectionTracker, LinkState, SecurityLevel};
use bondgate::deferred::IntentQueue;
use bondgate::deferred::worker::AdvertisingWorker;
use bondgate::error::LinkError;

use crate::mock_radio::{MockRadio, RecordingSink, addr};

const H: ConnHandle = ConnHandle(0x21);

fn worker(queue: &IntentQueue) -> AdvertisingWorker<'_> {
    let selector = AdvertisingSelector::new(&ControllerConfig::default()).unwrap();
    AdvertisingWorker::new(queue, selector)
}

fn connected(handle: ConnHandle) -> StackNotification {
    StackNotification::Connected {
        handle,
        peer: addr(1),
        status: STATUS_SUCCESS,
    }
}

#[test]
fn restart_waits_for_recycle() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(1);
    let mut sink = RecordingSink::new();

    q.submit(AdvTrigger::Boot);
    w.run_pending(&mut radio, &mut sink);
    assert_eq!(radio.start_attempts(), 1);

    radio.peer_connects();
    tracker.on_notification(connected(H), &mut sink).unwrap();

    tracker
        .on_notification(
            StackNotification::Disconnected {
                handle: H,
                reason: 0x13,
            },
            &mut sink,
        )
        .unwrap();
    assert!(w.run_pending(&mut radio, &mut sink).is_none());
    assert_eq!(radio.start_attempts(), 1);

    radio.link_released();
    tracker
        .on_notification(StackNotification::Recycled, &mut sink)
        .unwrap();
    let (trigger, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    assert_eq!(trigger, AdvTrigger::Recycled);
    assert_eq!(result.unwrap().mode, AdvertisingMode::Restricted);
    assert_eq!(radio.start_attempts(), 2);
}

#[test]
fn one_start_attempt_per_recycle() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    tracker.on_recycled(&mut sink);
    w.run_pending(&mut radio, &mut sink);
    w.run_pending(&mut radio, &mut sink);
    assert_eq!(radio.start_attempts(), 1);
}

#[test]
fn recycles_coalesce_into_one_restart() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut w = worker(&q);
    let mut radio = MockRadio::with_bonds(2);
    let mut sink = RecordingSink::new();

    tracker.on_recycled(&mut sink);
    tracker.on_recycled(&mut sink);
    w.run_pending(&mut radio, &mut sink);
    assert!(w.run_pending(&mut radio, &mut sink).is_none());
    assert_eq!(radio.start_attempts(), 1);
    assert_eq!(q.stats().coalesced, 1);
}

#[test]
fn failed_connect_does_not_restart() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut sink = RecordingSink::new();

    tracker
        .on_notification(
            StackNotification::Connected {
                handle: H,
                peer: addr(1),
                status: 0x3e,
            },
            &mut sink,
        )
        .unwrap();
    assert_eq!(tracker.state(), LinkState::Idle);
    assert!(!q.is_pending());
}

#[test]
fn security_and_passkey_follow_active_link() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut sink = RecordingSink::new();

    tracker.on_notification(connected(H), &mut sink).unwrap();
    tracker
        .on_notification(
            StackNotification::PasskeyDisplay {
                handle: H,
                passkey: 123_456,
            },
            &mut sink,
        )
        .unwrap();
    tracker
        .on_notification(
            StackNotification::SecurityChanged {
                handle: H,
                level: SecurityLevel::Authenticated,
                status: STATUS_SUCCESS,
            },
            &mut sink,
        )
        .unwrap();

    assert_eq!(
        tracker.active_link().unwrap().security,
        SecurityLevel::Authenticated
    );
    assert!(sink.contains(&AppEvent::PasskeyDisplay {
        handle: H,
        passkey: 123_456,
    }));
}

#[test]
fn notifications_after_release_are_rejected() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut sink = RecordingSink::new();

    tracker.on_notification(connected(H), &mut sink).unwrap();
    tracker
        .on_notification(
            StackNotification::Disconnected {
                handle: H,
                reason: 0x08,
            },
            &mut sink,
        )
        .unwrap();

    let late = tracker.on_notification(
        StackNotification::SecurityChanged {
            handle: H,
            level: SecurityLevel::Encrypted,
            status: STATUS_SUCCESS,
        },
        &mut sink,
    );
    assert_eq!(late, Err(LinkError::StaleHandle(H)));
    assert!(sink.contains(&AppEvent::LinkViolation(LinkError::StaleHandle(H))));
    assert_eq!(tracker.state(), LinkState::Idle);
    assert!(!q.is_pending());
}

#[test]
fn full_cycle_pairing_then_reconnect() {
    let q = IntentQueue::new();
    let mut tracker = ConnectionTracker::new(&q);
    let mut w = worker(&q);
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();

    // Boot with no bonds: open.
    q.submit(AdvTrigger::Boot);
    w.run_pending(&mut radio, &mut sink);
    assert_eq!(radio.advertising_mode(), Some(AdvertisingMode::Open));

    // A phone connects and bonds, then leaves.
    radio.peer_connects();
    tracker.on_notification(connected(H), &mut sink).unwrap();
    radio.bonds.push(addr(1));
    tracker
        .on_notification(
            StackNotification::Disconnected {
                handle: H,
                reason: 0x13,
            },
            &mut sink,
        )
        .unwrap();
    radio.link_released();
    tracker
        .on_notification(StackNotification::Recycled, &mut sink)
        .unwrap();

    // Restart restricts to the new bond.
    let (_, result) = w.run_pending(&mut radio, &mut sink).unwrap();
    let outcome = result.unwrap();
    assert_eq!(outcome.mode, AdvertisingMode::Restricted);
    assert_eq!(radio.accept_list, vec![addr(1)]);
}
