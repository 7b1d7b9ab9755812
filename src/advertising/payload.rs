//! Legacy advertising payload builder.
//!
//! ## Layout
//!
//! | PDU           | AD structure                 | Type   |
//! |---------------|------------------------------|--------|
//! | Advertising   | Flags (general, no BR/EDR)   | `0x01` |
//! | Advertising   | Complete local name          | `0x09` |
//! | Scan response | Complete 128-bit UUID list   | `0x07` |
//!
//! Both PDUs are capped at 31 bytes. The payload is built once from the
//! configuration and shared by the Open and Restricted parameter sets.

use heapless::Vec;

use crate::error::ConfigError;

/// Maximum AD payload length of a legacy advertising PDU.
pub const LEGACY_ADV_MAX: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID128_ALL: u8 = 0x07;
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

const FLAG_LE_GENERAL_DISCOVERABLE: u8 = 0x02;
const FLAG_BREDR_NOT_SUPPORTED: u8 = 0x04;

/// Raw advertising and scan-response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvPayload {
    adv_data: Vec<u8, LEGACY_ADV_MAX>,
    scan_response: Vec<u8, LEGACY_ADV_MAX>,
}

impl AdvPayload {
    /// Build the payload for `name` and the primary service `service_uuid`.
    pub fn build(name: &str, service_uuid: u128) -> Result<Self, ConfigError> {
        let mut adv_data = Vec::new();
        push_ad(
            &mut adv_data,
            AD_TYPE_FLAGS,
            &[FLAG_LE_GENERAL_DISCOVERABLE | FLAG_BREDR_NOT_SUPPORTED],
        )?;
        push_ad(&mut adv_data, AD_TYPE_NAME_COMPLETE, name.as_bytes())?;

        let mut scan_response = Vec::new();
        push_ad(
            &mut scan_response,
            AD_TYPE_UUID128_ALL,
            &service_uuid.to_le_bytes(),
        )?;

        Ok(Self {
            adv_data,
            scan_response,
        })
    }

    pub fn adv_data(&self) -> &[u8] {
        &self.adv_data
    }

    pub fn scan_response(&self) -> &[u8] {
        &self.scan_response
    }
}

fn push_ad(
    buf: &mut Vec<u8, LEGACY_ADV_MAX>,
    ad_type: u8,
    data: &[u8],
) -> Result<(), ConfigError> {
    if buf.len() + 2 + data.len() > LEGACY_ADV_MAX {
        return Err(ConfigError::PayloadTooLarge);
    }
    // Length byte counts the type byte plus data; bounded above by 30.
    let len = (data.len() + 1) as u8;
    buf.push(len).map_err(|_| ConfigError::PayloadTooLarge)?;
    buf.push(ad_type).map_err(|_| ConfigError::PayloadTooLarge)?;
    buf.extend_from_slice(data)
        .map_err(|_| ConfigError::PayloadTooLarge)
}
