//! Device, device-type/subtype, device-address, and MAC pool/address
//! payloads.

use bam_util::normalize::normalize_mac;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{RowFields, RowPayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypePayload {
    pub name: String,
}

impl RowPayload for DeviceTypePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (Self { name }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSubtypePayload {
    pub name: String,
    pub parent_device_type: String,
}

impl RowPayload for DeviceSubtypePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let parent_device_type = fields.required(row_id, "parent_device_type", &mut errors).to_string();
        (Self { name, parent_device_type }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub name: String,
    pub device_type: String,
    pub device_subtype: Option<String>,
}

impl RowPayload for DevicePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let device_type = fields.required(row_id, "device_type", &mut errors).to_string();
        (
            Self {
                name,
                device_type,
                device_subtype: fields.optional("device_subtype").map(str::to_owned),
            },
            errors,
        )
    }
}

/// Immutable link between a device and an address; the handler rejects an
/// `update` action for this kind (update idiom 1: not supported).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAddressPayload {
    pub device: String,
    pub address: String,
}

impl RowPayload for DeviceAddressPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let device = fields.required(row_id, "device", &mut errors).to_string();
        let address = fields.required(row_id, "address", &mut errors).to_string();
        (Self { device, address }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacPoolPayload {
    pub name: String,
}

impl RowPayload for MacPoolPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (Self { name }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddressPayload {
    pub mac_address: String,
    pub parent_pool: Option<String>,
}

impl RowPayload for MacAddressPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let raw = fields.required(row_id, "mac_address", &mut errors);
        let mac_address = normalize_mac(raw).unwrap_or_else(|message| {
            if !raw.is_empty() {
                errors.push(ValidationError::new(row_id, "mac_address", message));
            }
            raw.to_string()
        });
        (
            Self {
                mac_address,
                parent_pool: fields.optional("parent_pool").map(str::to_owned),
            },
            errors,
        )
    }
}
