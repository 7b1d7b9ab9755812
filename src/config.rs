//! Controller configuration parameters
//!
//! All tunable parameters for the advertising controller. Defaults: the
//! 100-150 ms fast advertising interval pair, scan-request filtering in
//! Restricted mode, button 0 erases bonds and button 1 enters pairing
//! mode.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest device name that still fits the flags AD in a legacy PDU.
pub const MAX_DEVICE_NAME_LEN: usize = 26;

/// Advertising interval bounds in 0.625 ms units (Bluetooth Core Vol 6 Part B, 4.4.2.2).
const ADV_INTERVAL_MIN_LIMIT: u16 = 0x0020;
const ADV_INTERVAL_MAX_LIMIT: u16 = 0x4000;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Identity ---
    /// Complete local name placed in the advertising data
    pub device_name: String<MAX_DEVICE_NAME_LEN>,
    /// 128-bit primary service UUID placed in the scan response
    pub service_uuid: u128,
    /// Local identity whose bonds populate the accept list
    pub local_identity: u8,

    // --- Advertising ---
    /// Minimum advertising interval (0.625 ms units)
    pub adv_interval_min: u16,
    /// Maximum advertising interval (0.625 ms units)
    pub adv_interval_max: u16,
    /// Also filter scan requests through the accept list in Restricted mode
    pub filter_scan_requests: bool,

    // --- Bonding ---
    /// Erase every bond before the first advertising start
    pub erase_bonds_on_boot: bool,

    // --- Input ---
    /// Button that erases all bonds
    pub bond_erase_button: u8,
    /// Button that enters pairing mode
    pub pairing_button: u8,
    /// Level must be stable this long before an edge is reported (ms)
    pub button_debounce_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let mut device_name = String::new();
        // "Bondgate" always fits the name buffer.
        let _ = device_name.push_str("Bondgate");
        Self {
            device_name,
            service_uuid: 0x0000_1523_1212_efde_1523_785f_eabc_d123,
            local_identity: 0,

            adv_interval_min: 0x00a0, // 100 ms
            adv_interval_max: 0x00f0, // 150 ms
            filter_scan_requests: true,

            erase_bonds_on_boot: false,

            bond_erase_button: 0,
            pairing_button: 1,
            button_debounce_ms: 50,
        }
    }
}

impl ControllerConfig {
    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::ValidationFailed("device_name is empty"));
        }
        if self.adv_interval_min < ADV_INTERVAL_MIN_LIMIT {
            return Err(ConfigError::ValidationFailed(
                "adv_interval_min below 20 ms",
            ));
        }
        if self.adv_interval_max > ADV_INTERVAL_MAX_LIMIT {
            return Err(ConfigError::ValidationFailed(
                "adv_interval_max above 10.24 s",
            ));
        }
        if self.adv_interval_min > self.adv_interval_max {
            return Err(ConfigError::ValidationFailed(
                "adv_interval_min above adv_interval_max",
            ));
        }
        if self.bond_erase_button == self.pairing_button {
            return Err(ConfigError::ValidationFailed(
                "bond_erase_button and pairing_button are the same",
            ));
        }
        if self.button_debounce_ms == 0 || self.button_debounce_ms > 1000 {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms outside 1..=1000",
            ));
        }
        Ok(())
    }
}
