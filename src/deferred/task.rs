//! Worker thread spawning.
//!
//! The advertising worker runs in a dedicated thread: an
//! `edge-executor` [`LocalExecutor`](edge_executor::LocalExecutor)
//! driven by `futures_lite::future::block_on`, parked on the queue's
//! signal between triggers.
//!
//! On ESP-IDF, `esp_pthread_set_cfg()` pins the next `std::thread` to a
//! core with explicit priority and stack. The config/spawn pair must not
//! be interleaved with other thread creation on the calling thread.

use std::io;
use std::thread::JoinHandle;

use log::info;

use super::IntentQueue;
use super::worker::AdvertisingWorker;
use crate::advertising::AdvertisingSelector;
use crate::app::ports::{AcceptListPort, AdvertiserPort, BondStorePort, EventSink};

/// Worker stack size in KiB. The selector keeps everything on the stack
/// (bond list, accept list snapshot, payload).
pub const WORKER_STACK_KB: usize = 6;

/// Worker priority; below the BLE host task.
pub const WORKER_PRIORITY: u8 = 5;

const WORKER_NAME: &str = "adv-worker\0";

/// CPU core identifiers for the ESP32 dual-core parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), where the Bluedroid host runs.
    Pro = 0,
    /// Core 1 (APP_CPU).
    App = 1,
}

/// Start the advertising worker on its own thread.
pub fn spawn<H, S>(
    queue: &'static IntentQueue,
    selector: AdvertisingSelector,
    mut hw: H,
    mut sink: S,
) -> io::Result<JoinHandle<()>>
where
    H: AdvertiserPort + AcceptListPort + BondStorePort + Send + 'static,
    S: EventSink + Send + 'static,
{
    spawn_on_core(Core::Pro, WORKER_PRIORITY, WORKER_STACK_KB, WORKER_NAME, move || {
        let executor: edge_executor::LocalExecutor<'_, 1> = edge_executor::LocalExecutor::new();
        let worker = AdvertisingWorker::new(queue, selector);
        futures_lite::future::block_on(executor.run(worker.run(&mut hw, &mut sink)));
    })
}

#[cfg(feature = "espidf")]
fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct is fully initialised by the IDF default
    // constructor and `name` is NUL-terminated and 'static.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name, core, priority, stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Host fallback: ignores core affinity and priority.
#[cfg(not(feature = "espidf"))]
fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    info!(
        "Spawning '{}' (host, no core pinning, stack={}KB)",
        display_name, stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
