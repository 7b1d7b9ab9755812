//! Bondgate firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Bluedroid task          Worker thread          Main task     │
//! │  (notifications)         (deferred work)        (input poll)  │
//! │                                                               │
//! │  ConnectionTracker ──┐                      ┌── InputRouter   │
//! │                      ▼                      ▼                 │
//! │                  ┌────────────────────────────┐               │
//! │                  │   IntentQueue (1 slot)     │               │
//! │                  └─────────────┬──────────────┘               │
//! │                                ▼                              │
//! │                       AdvertisingWorker                       │
//! │                  (selector + accept list)                     │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ─────────────────       │
//! │         RadioAdapter (Bluedroid)    LogEventSink              │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use std::sync::Mutex;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, IOPin, Input, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use bondgate::adapters::log_sink::LogEventSink;
use bondgate::adapters::radio::RadioAdapter;
use bondgate::advertising::AdvertisingSelector;
use bondgate::app::notifications::StackNotification;
use bondgate::config::ControllerConfig;
use bondgate::connection::ConnectionTracker;
use bondgate::deferred::{IntentQueue, task};
use bondgate::drivers::button::DebouncedButton;
use bondgate::input::{ButtonEdge, ButtonId, InputRouter};

/// Input poll period.
const POLL_MS: u32 = 10;

static QUEUE: IntentQueue = IntentQueue::new();

/// Owned by the Bluedroid task once callbacks are registered.
static TRACKER: Mutex<Option<ConnectionTracker<'static>>> = Mutex::new(None);

fn on_stack_notification(notification: StackNotification) {
    let Ok(mut guard) = TRACKER.lock() else {
        warn!("LINK: tracker lock poisoned, {:?} dropped", notification);
        return;
    };
    if let Some(tracker) = guard.as_mut() {
        // Violations are already logged and reported by the tracker.
        let _ = tracker.on_notification(notification, &mut LogEventSink);
    }
}

fn now_ms() -> u32 {
    // SAFETY: esp_timer is started by the IDF before app_main.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
}

// Pull configuration needs an IO-capable pin.
type Button<'d> = DebouncedButton<PinDriver<'d, AnyIOPin, Input>>;

fn button(pin: AnyIOPin, debounce_ms: u32) -> Result<Button<'static>> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(DebouncedButton::new(driver, debounce_ms))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("Bondgate v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = ControllerConfig::default();
    config.validate()?;

    // ── 3. Connection tracker, then the stack that feeds it ───
    if let Ok(mut guard) = TRACKER.lock() {
        *guard = Some(ConnectionTracker::new(&QUEUE));
    }
    RadioAdapter::set_notification_handler(on_stack_notification);
    let mut radio = RadioAdapter::new(&config.device_name)?;

    // ── 4. Advertising worker ─────────────────────────────────
    let selector = AdvertisingSelector::new(&config)?;
    let _worker = task::spawn(&QUEUE, selector, radio.clone(), LogEventSink)?;

    // ── 5. Input: boot intent, then button polling ────────────
    let mut sink = LogEventSink;
    let router = InputRouter::new(&QUEUE, &config);
    router.boot(&mut radio, &mut sink);

    // Bond erase on GPIO4, pairing on the BOOT button (GPIO0).
    let peripherals = Peripherals::take()?;
    let mut buttons: [(ButtonId, Button<'static>); 2] = [
        (
            config.bond_erase_button,
            button(peripherals.pins.gpio4.downgrade(), config.button_debounce_ms)?,
        ),
        (
            config.pairing_button,
            button(peripherals.pins.gpio0.downgrade(), config.button_debounce_ms)?,
        ),
    ];

    info!("INPUT: polling buttons every {}ms", POLL_MS);
    loop {
        let now = now_ms();
        for (id, btn) in &mut buttons {
            match btn.poll(now) {
                Ok(Some(edge)) => {
                    let edge = ButtonEdge { button: *id, edge };
                    router.on_button_edge(edge, &mut radio, &mut sink);
                }
                Ok(None) => {}
                Err(e) => warn!("INPUT: button {} read failed: {:?}", id, e),
            }
        }
        let stats = QUEUE.stats();
        if stats.submitted > 0 && now % 60_000 < POLL_MS {
            info!(
                "DEFER: {} intents submitted, {} coalesced",
                stats.submitted, stats.coalesced
            );
        }
        FreeRtos::delay_ms(POLL_MS);
    }
}
