//! IP block/network/address and DHCP range payloads.

use bam_util::normalize::normalize_cidr;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{RowFields, RowPayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip4BlockPayload {
    pub cidr: String,
    pub name: Option<String>,
    properties: Vec<String>,
}

impl Ip4BlockPayload {
    pub fn get_properties_list(&self) -> &[String] {
        &self.properties
    }
}

impl RowPayload for Ip4BlockPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let cidr_raw = fields.required(row_id, "cidr", &mut errors);
        let cidr = normalize_cidr(cidr_raw).unwrap_or_else(|message| {
            errors.push(ValidationError::new(row_id, "cidr", message));
            cidr_raw.to_string()
        });
        (
            Self {
                cidr,
                name: fields.optional("name").map(str::to_owned),
                properties: fields.list("properties"),
            },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip4NetworkPayload {
    pub cidr: String,
    pub name: Option<String>,
    pub parent_block_cidr: Option<String>,
}

impl RowPayload for Ip4NetworkPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let cidr_raw = fields.required(row_id, "cidr", &mut errors);
        let cidr = normalize_cidr(cidr_raw).unwrap_or_else(|message| {
            errors.push(ValidationError::new(row_id, "cidr", message));
            cidr_raw.to_string()
        });
        (
            Self {
                cidr,
                name: fields.optional("name").map(str::to_owned),
                parent_block_cidr: fields.optional("parent_block_cidr").map(str::to_owned),
            },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip4AddressPayload {
    pub address: String,
    pub name: Option<String>,
    pub mac_address: Option<String>,
    pub parent_network_cidr: Option<String>,
}

impl RowPayload for Ip4AddressPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let address = fields.required(row_id, "address", &mut errors).to_string();
        if address.parse::<std::net::Ipv4Addr>().is_err() && !address.is_empty() {
            errors.push(ValidationError::new(row_id, "address", format!("`{address}` is not a valid IPv4 address")));
        }
        let mac_address = fields.optional("mac_address").map(|raw| {
            bam_util::normalize::normalize_mac(raw).unwrap_or_else(|message| {
                errors.push(ValidationError::new(row_id, "mac_address", message));
                raw.to_string()
            })
        });
        (
            Self {
                address,
                name: fields.optional("name").map(str::to_owned),
                mac_address,
                parent_network_cidr: fields.optional("parent_network_cidr").map(str::to_owned),
            },
            errors,
        )
    }
}

macro_rules! simple_cidr_payload {
    ($name:ident, $field:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub cidr: String,
            pub name: Option<String>,
        }

        impl RowPayload for $name {
            fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
                let mut errors = Vec::new();
                let cidr_raw = fields.required(row_id, $field, &mut errors);
                let cidr = normalize_cidr(cidr_raw).unwrap_or_else(|message| {
                    errors.push(ValidationError::new(row_id, $field, message));
                    cidr_raw.to_string()
                });
                (
                    Self {
                        cidr,
                        name: fields.optional("name").map(str::to_owned),
                    },
                    errors,
                )
            }
        }
    };
}

simple_cidr_payload!(Ip6BlockPayload, "cidr");
simple_cidr_payload!(Ip6NetworkPayload, "cidr");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip6AddressPayload {
    pub address: String,
    pub name: Option<String>,
}

impl RowPayload for Ip6AddressPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let address = fields.required(row_id, "address", &mut errors).to_string();
        if !address.is_empty() && address.parse::<std::net::Ipv6Addr>().is_err() {
            errors.push(ValidationError::new(row_id, "address", format!("`{address}` is not a valid IPv6 address")));
        }
        (
            Self {
                address,
                name: fields.optional("name").map(str::to_owned),
            },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpRangePayload {
    pub start_address: String,
    pub end_address: String,
    pub parent_network_cidr: Option<String>,
}

impl RowPayload for DhcpRangePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let start_address = fields.required(row_id, "start_address", &mut errors).to_string();
        let end_address = fields.required(row_id, "end_address", &mut errors).to_string();
        (
            Self {
                start_address,
                end_address,
                parent_network_cidr: fields.optional("parent_network_cidr").map(str::to_owned),
            },
            errors,
        )
    }
}

pub type Ipv4DhcpRangePayload = DhcpRangePayload;
pub type Ipv6DhcpRangePayload = DhcpRangePayload;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, &str)]) -> RowFields {
        RowFields::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn ip4_block_validates_cidr() {
        let (payload, errors) = Ip4BlockPayload::parse("r1", &fields(&[("cidr", "10.0.0.0/8")]));
        assert!(errors.is_empty());
        assert_eq!(payload.cidr, "10.0.0.0/8");

        let (_, errors) = Ip4BlockPayload::parse("r1", &fields(&[("cidr", "not-a-cidr")]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn ip4_address_validates_and_normalizes_mac() {
        let (payload, errors) = Ip4AddressPayload::parse(
            "r2",
            &fields(&[("address", "10.0.1.5"), ("mac_address", "aa-bb-cc-dd-ee-ff")]),
        );
        assert!(errors.is_empty());
        assert_eq!(payload.mac_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn missing_required_field_is_collected_not_thrown() {
        let (_, errors) = Ip4NetworkPayload::parse("r3", &fields(&[]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cidr");
    }
}
