//! Radio adapter: Bluedroid GAP/GATTS on ESP-IDF, in-memory simulation
//! on the host.
//!
//! Implements [`AdvertiserPort`], [`AcceptListPort`] and
//! [`BondStorePort`], and (on device) translates Bluedroid callbacks into
//! [`StackNotification`]s for the connection tracker.
//!
//! ## Bluedroid notes
//!
//! - Bluedroid has no "connection object released" callback. The GATTS
//!   disconnect event is delivered once the link is fully torn down, so
//!   the adapter emits `Disconnected` followed immediately by `Recycled`.
//! - Bluedroid reports peer addresses most-significant byte first; the
//!   controller stores them little-endian.
//! - There is only one local identity; the `identity` argument of the
//!   bond store calls is ignored.
//!
//! The adapter itself is a cheap handle (`Clone`): the worker thread and
//! the input loop each own one.

use log::info;

use crate::advertising::payload::AdvPayload;
use crate::advertising::AdvParams;
use crate::app::ports::{AcceptListPort, AdvertiserPort, BondStorePort};
use crate::bond::{BleAddress, BondList};
use crate::error::{BondStoreError, RadioError};

#[cfg(feature = "espidf")]
use crate::app::notifications::StackNotification;

#[cfg(not(feature = "espidf"))]
use std::sync::{Arc, Mutex};

/// Controller filter accept list size on the host simulation.
#[cfg(not(feature = "espidf"))]
pub const SIM_FILTER_CAPACITY: usize = crate::bond::MAX_BONDS;

/// Refuse an add once the controller list holds `capacity` entries.
/// Other add failures keep their stack error code.
pub fn filter_slot(installed: usize, capacity: usize) -> Result<(), RadioError> {
    if installed >= capacity {
        return Err(RadioError::FilterListFull);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Host simulation state
// ───────────────────────────────────────────────────────────────

#[cfg(not(feature = "espidf"))]
#[derive(Debug, Default)]
struct SimState {
    advertising: Option<AdvParams>,
    accept_list: Vec<BleAddress>,
    bonds: Vec<BleAddress>,
}

#[derive(Clone)]
pub struct RadioAdapter {
    #[cfg(not(feature = "espidf"))]
    sim: Arc<Mutex<SimState>>,
}

impl RadioAdapter {
    /// Bring up the controller and host stack.
    ///
    /// On ESP-IDF this initialises the BT controller in BLE-only mode,
    /// enables Bluedroid, registers the GAP/GATTS callbacks and
    /// configures bonding with passkey display. Call once.
    pub fn new(device_name: &str) -> Result<Self, RadioError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: called once from the main task before any other
            // Bluedroid API use.
            unsafe { bluedroid::bring_up(device_name)? };
            info!("RADIO(espidf): Bluedroid up as '{}'", device_name);
            Ok(Self {})
        }

        #[cfg(not(feature = "espidf"))]
        {
            info!("RADIO(sim): simulation backend as '{}'", device_name);
            Ok(Self {
                sim: Arc::new(Mutex::new(SimState::default())),
            })
        }
    }

    /// Route Bluedroid connection callbacks to `handler`. Only the first
    /// installed handler takes effect.
    #[cfg(feature = "espidf")]
    pub fn set_notification_handler(handler: fn(StackNotification)) -> bool {
        bluedroid::NOTIFY.set(handler).is_ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation helpers
// ───────────────────────────────────────────────────────────────

#[cfg(not(feature = "espidf"))]
impl RadioAdapter {
    fn with_sim<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> Result<R, RadioError> {
        let mut sim = self.sim.lock().map_err(|_| RadioError::NotReady)?;
        Ok(f(&mut sim))
    }

    /// Persist a bond, as a completed pairing would.
    pub fn sim_add_bond(&self, peer: BleAddress) {
        let _ = self.with_sim(|s| {
            if !s.bonds.contains(&peer) {
                s.bonds.push(peer);
            }
        });
    }

    /// Parameters of the running advertising set, if any.
    pub fn sim_advertising(&self) -> Option<AdvParams> {
        self.with_sim(|s| s.advertising).ok().flatten()
    }

    pub fn sim_accept_list(&self) -> Vec<BleAddress> {
        self.with_sim(|s| s.accept_list.clone()).unwrap_or_default()
    }

    /// An incoming connection ends advertising implicitly.
    pub fn sim_connection_established(&self) {
        let _ = self.with_sim(|s| s.advertising = None);
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl AdvertiserPort for RadioAdapter {
    fn start_advertising(
        &mut self,
        params: &AdvParams,
        payload: &AdvPayload,
    ) -> Result<(), RadioError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up (`new` succeeded) and the data
            // buffers outlive the calls, which copy them.
            unsafe { bluedroid::start_advertising(params, payload) }
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.with_sim(|s| {
                if s.advertising.is_some() {
                    return Err(RadioError::Busy);
                }
                info!(
                    "RADIO(sim): advertising {:?} ({} + {} bytes)",
                    params.mode,
                    payload.adv_data().len(),
                    payload.scan_response().len()
                );
                s.advertising = Some(*params);
                Ok(())
            })?
        }
    }

    fn stop_advertising(&mut self) -> Result<(), RadioError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up.
            bluedroid::check(unsafe { esp_idf_svc::sys::esp_ble_gap_stop_advertising() })
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.with_sim(|s| s.advertising = None)
        }
    }
}

impl AcceptListPort for RadioAdapter {
    fn accept_list_clear(&mut self) -> Result<(), RadioError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up.
            unsafe { bluedroid::accept_list_clear() }
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.with_sim(|s| s.accept_list.clear())
        }
    }

    fn accept_list_add(&mut self, addr: &BleAddress) -> Result<(), RadioError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up; the address buffer is copied.
            unsafe { bluedroid::accept_list_add(addr) }
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.with_sim(|s| {
                filter_slot(s.accept_list.len(), SIM_FILTER_CAPACITY)?;
                s.accept_list.push(*addr);
                Ok(())
            })?
        }
    }
}

impl BondStorePort for RadioAdapter {
    fn enumerate_bonds(
        &mut self,
        _identity: u8,
        out: &mut BondList,
    ) -> Result<(), BondStoreError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up.
            unsafe { bluedroid::enumerate_bonds(out) }
        }

        #[cfg(not(feature = "espidf"))]
        {
            let bonds = self
                .with_sim(|s| s.bonds.clone())
                .map_err(|_| BondStoreError::ReadFailed)?;
            for peer in bonds {
                out.push(crate::bond::BondRecord::new(peer))
                    .map_err(|_| BondStoreError::CapacityExceeded)?;
            }
            Ok(())
        }
    }

    fn erase_all_bonds(&mut self, _identity: u8) -> Result<(), BondStoreError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: Bluedroid is up.
            unsafe { bluedroid::erase_all_bonds() }
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.with_sim(|s| s.bonds.clear())
                .map_err(|_| BondStoreError::EraseFailed)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Bluedroid glue
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
mod bluedroid {
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::OnceLock;

    use esp_idf_svc::sys::*;
    use log::{error, info, warn};

    use crate::advertising::payload::AdvPayload;
    use crate::advertising::AdvParams;
    use crate::app::notifications::{STATUS_SUCCESS, StackNotification};
    use crate::bond::{AddressKind, BleAddress, BondList, BondRecord, MAX_BONDS};
    use crate::connection::{ConnHandle, SecurityLevel};
    use crate::error::{BondStoreError, RadioError};

    /// Notification sink installed by the application.
    pub(super) static NOTIFY: OnceLock<fn(StackNotification)> = OnceLock::new();

    const NO_CONN: u32 = u32::MAX;

    /// Bluedroid reports security events by address; this maps them back
    /// to the one active connection id.
    static ACTIVE_CONN_ID: AtomicU32 = AtomicU32::new(NO_CONN);

    /// Whitelist entries installed since the last clear. Bluedroid does
    /// not report a full list distinctly, so the adapter counts.
    static WL_INSTALLED: AtomicUsize = AtomicUsize::new(0);

    fn notify(n: StackNotification) {
        match NOTIFY.get() {
            Some(handler) => handler(n),
            None => warn!("RADIO: notification dropped, no handler: {:?}", n),
        }
    }

    fn active_handle() -> Option<ConnHandle> {
        match ACTIVE_CONN_ID.load(Ordering::Acquire) {
            NO_CONN => None,
            id => Some(ConnHandle(id as u16)),
        }
    }

    pub(super) fn check(ret: esp_err_t) -> Result<(), RadioError> {
        match ret {
            r if r == ESP_OK as esp_err_t => Ok(()),
            r if r == ESP_ERR_INVALID_STATE as esp_err_t => Err(RadioError::Busy),
            r if r == ESP_ERR_INVALID_ARG as esp_err_t => Err(RadioError::InvalidParams),
            r => Err(RadioError::Code(r)),
        }
    }

    /// Bluedroid MSB-first address to little-endian storage.
    fn from_bda(bda: &esp_bd_addr_t, public: bool) -> BleAddress {
        let mut bytes = *bda;
        bytes.reverse();
        if public {
            BleAddress::public(bytes)
        } else {
            BleAddress::random(bytes)
        }
    }

    fn to_bda(addr: &BleAddress) -> esp_bd_addr_t {
        let mut bda = addr.bytes;
        bda.reverse();
        bda
    }

    pub(super) unsafe fn bring_up(device_name: &str) -> Result<(), RadioError> {
        unsafe {
            // Release classic BT memory (BLE-only mode).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            stage("bt_controller_init", esp_bt_controller_init(&mut bt_cfg))?;
            stage(
                "bt_controller_enable",
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
            )?;
            stage("bluedroid_init", esp_bluedroid_init())?;
            stage("bluedroid_enable", esp_bluedroid_enable())?;

            stage(
                "gap_register_callback",
                esp_ble_gap_register_callback(Some(gap_event_handler)),
            )?;
            stage(
                "gatts_register_callback",
                esp_ble_gatts_register_callback(Some(gatts_event_handler)),
            )?;
            stage("gatts_app_register", esp_ble_gatts_app_register(0))?;

            // Bonding with MITM protection; we can only display a passkey.
            let auth_req = esp_ble_auth_req_t_ESP_LE_AUTH_REQ_SC_MITM_BOND;
            let iocap = esp_ble_io_cap_t_ESP_IO_CAP_OUT;
            let key_size: u8 = 16;
            let init_key: u8 = (ESP_BLE_ENC_KEY_MASK | ESP_BLE_ID_KEY_MASK) as u8;
            let rsp_key: u8 = (ESP_BLE_ENC_KEY_MASK | ESP_BLE_ID_KEY_MASK) as u8;
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_AUTHEN_REQ_MODE,
                &auth_req as *const _ as *mut _,
                core::mem::size_of_val(&auth_req) as u8,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_IOCAP_MODE,
                &iocap as *const _ as *mut _,
                core::mem::size_of_val(&iocap) as u8,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_MAX_KEY_SIZE,
                &key_size as *const _ as *mut _,
                1,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_SET_INIT_KEY,
                &init_key as *const _ as *mut _,
                1,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_SET_RSP_KEY,
                &rsp_key as *const _ as *mut _,
                1,
            );

            let mut name: heapless::Vec<u8, 32> = heapless::Vec::new();
            if name.extend_from_slice(device_name.as_bytes()).is_err() || name.push(0).is_err() {
                return Err(RadioError::InvalidParams);
            }
            check(esp_ble_gap_set_device_name(name.as_ptr().cast()))?;
        }
        Ok(())
    }

    fn stage(what: &str, ret: esp_err_t) -> Result<(), RadioError> {
        check(ret).inspect_err(|e| error!("RADIO: {} failed ({})", what, e))
    }

    pub(super) unsafe fn start_advertising(
        params: &AdvParams,
        payload: &AdvPayload,
    ) -> Result<(), RadioError> {
        let filter = match (params.filter_connections, params.filter_scan_requests) {
            (false, _) => esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            (true, false) => esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_WLST,
            (true, true) => esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_WLST_CON_WLST,
        };

        // The config calls copy the data into the Bluedroid task queue,
        // which processes them before the start.
        let mut adv = [0u8; crate::advertising::payload::LEGACY_ADV_MAX];
        let mut rsp = [0u8; crate::advertising::payload::LEGACY_ADV_MAX];
        adv[..payload.adv_data().len()].copy_from_slice(payload.adv_data());
        rsp[..payload.scan_response().len()].copy_from_slice(payload.scan_response());

        unsafe {
            check(esp_ble_gap_config_adv_data_raw(
                adv.as_mut_ptr(),
                payload.adv_data().len() as u32,
            ))?;
            check(esp_ble_gap_config_scan_rsp_data_raw(
                rsp.as_mut_ptr(),
                payload.scan_response().len() as u32,
            ))?;

            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: params.interval_min,
                adv_int_max: params.interval_max,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: filter,
                ..core::mem::zeroed()
            };
            check(esp_ble_gap_start_advertising(&mut adv_params))
        }
    }

    pub(super) unsafe fn accept_list_clear() -> Result<(), RadioError> {
        check(unsafe { esp_ble_gap_clear_whitelist() })?;
        WL_INSTALLED.store(0, Ordering::Release);
        Ok(())
    }

    fn whitelist_capacity() -> Result<usize, RadioError> {
        let mut len: u16 = 0;
        // SAFETY: Bluedroid is up; `len` outlives the call.
        check(unsafe { esp_ble_gap_get_whitelist_size(&mut len) })?;
        Ok(len as usize)
    }

    pub(super) unsafe fn accept_list_add(addr: &BleAddress) -> Result<(), RadioError> {
        super::filter_slot(WL_INSTALLED.load(Ordering::Acquire), whitelist_capacity()?)?;
        let wl_type = match addr.kind {
            AddressKind::Public => esp_ble_wl_addr_type_t_BLE_WL_ADDR_TYPE_PUBLIC,
            _ => esp_ble_wl_addr_type_t_BLE_WL_ADDR_TYPE_RANDOM,
        };
        let mut bda = to_bda(addr);
        check(unsafe { esp_ble_gap_update_whitelist(true, bda.as_mut_ptr(), wl_type) })?;
        WL_INSTALLED.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    unsafe fn bond_devices() -> Result<heapless::Vec<esp_ble_bond_dev_t, MAX_BONDS>, BondStoreError> {
        let count = unsafe { esp_ble_get_bond_device_num() };
        if count < 0 {
            return Err(BondStoreError::ReadFailed);
        }
        if count as usize > MAX_BONDS {
            return Err(BondStoreError::CapacityExceeded);
        }

        let mut list: [esp_ble_bond_dev_t; MAX_BONDS] = unsafe { core::mem::zeroed() };
        let mut n = count;
        let ret = unsafe { esp_ble_get_bond_device_list(&mut n, list.as_mut_ptr()) };
        if ret != ESP_OK as esp_err_t {
            return Err(BondStoreError::Code(ret));
        }

        let mut out = heapless::Vec::new();
        for dev in list.iter().take(n as usize) {
            out.push(*dev).map_err(|_| BondStoreError::CapacityExceeded)?;
        }
        Ok(out)
    }

    pub(super) unsafe fn enumerate_bonds(out: &mut BondList) -> Result<(), BondStoreError> {
        for dev in unsafe { bond_devices()? } {
            let public = dev.bd_addr_type == esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC;
            out.push(BondRecord::new(from_bda(&dev.bd_addr, public)))
                .map_err(|_| BondStoreError::CapacityExceeded)?;
        }
        Ok(())
    }

    pub(super) unsafe fn erase_all_bonds() -> Result<(), BondStoreError> {
        for mut dev in unsafe { bond_devices()? } {
            let ret = unsafe { esp_ble_remove_bond_device(dev.bd_addr.as_mut_ptr()) };
            if ret != ESP_OK as esp_err_t {
                return Err(BondStoreError::EraseFailed);
            }
        }
        Ok(())
    }

    unsafe extern "C" fn gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                let status = unsafe { (*param).adv_start_cmpl.status };
                if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                    info!("RADIO: advertising started");
                } else {
                    warn!("RADIO: advertising start completed with status {}", status);
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_SEC_REQ_EVT => unsafe {
                esp_ble_gap_security_rsp((*param).ble_security.ble_req.bd_addr.as_mut_ptr(), true);
            },
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_PASSKEY_NOTIF_EVT => {
                let passkey = unsafe { (*param).ble_security.key_notif.passkey };
                if let Some(handle) = active_handle() {
                    notify(StackNotification::PasskeyDisplay { handle, passkey });
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_AUTH_CMPL_EVT => {
                let p = unsafe { &(*param).ble_security.auth_cmpl };
                let Some(handle) = active_handle() else {
                    return;
                };
                let level = if p.auth_mode as u32 & ESP_LE_AUTH_REQ_MITM != 0 {
                    SecurityLevel::Authenticated
                } else {
                    SecurityLevel::Encrypted
                };
                let status = if p.success {
                    STATUS_SUCCESS
                } else {
                    // SMP reason codes fit in a byte; never report 0 on failure.
                    (p.fail_reason as u8).max(1)
                };
                notify(StackNotification::SecurityChanged {
                    handle,
                    level,
                    status,
                });
            }
            _ => {}
        }
    }

    unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        _gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        match event {
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let p = unsafe { &(*param).connect };
                ACTIVE_CONN_ID.store(p.conn_id as u32, Ordering::Release);
                let public = p.ble_addr_type == esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC;
                notify(StackNotification::Connected {
                    handle: ConnHandle(p.conn_id),
                    peer: from_bda(&p.remote_bda, public),
                    status: STATUS_SUCCESS,
                });
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                let p = unsafe { &(*param).disconnect };
                ACTIVE_CONN_ID.store(NO_CONN, Ordering::Release);
                notify(StackNotification::Disconnected {
                    handle: ConnHandle(p.conn_id),
                    reason: p.reason as u8,
                });
                notify(StackNotification::Recycled);
            }
            _ => {}
        }
    }
}
