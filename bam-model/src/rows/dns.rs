//! DNS zone and record payloads.

use bam_util::normalize::normalize_fqdn;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{RowFields, RowPayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsZonePayload {
    pub absolute_name: String,
    parent_zones: Vec<String>,
}

impl DnsZonePayload {
    pub fn get_parent_zones_list(&self) -> &[String] {
        &self.parent_zones
    }
}

impl RowPayload for DnsZonePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let raw = fields.required(row_id, "absolute_name", &mut errors);
        (
            Self {
                absolute_name: normalize_fqdn(raw),
                parent_zones: fields.list("parent_zones"),
            },
            errors,
        )
    }
}

macro_rules! name_value_ttl_record {
    ($name:ident, $value_field:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub absolute_name: String,
            pub value: String,
            pub ttl: Option<u32>,
        }

        impl RowPayload for $name {
            fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
                let mut errors = Vec::new();
                let absolute_name = normalize_fqdn(fields.required(row_id, "absolute_name", &mut errors));
                let value = fields.required(row_id, $value_field, &mut errors).to_string();
                let ttl = fields.optional("ttl").map(|raw| {
                    raw.parse::<u32>().unwrap_or_else(|_| {
                        errors.push(ValidationError::new(row_id, "ttl", format!("`{raw}` is not a valid TTL")));
                        0
                    })
                });
                (Self { absolute_name, value, ttl }, errors)
            }
        }
    };
}

name_value_ttl_record!(AliasRecordPayload, "linked_record");
name_value_ttl_record!(TxtRecordPayload, "text");
name_value_ttl_record!(ExternalHostRecordPayload, "address");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecordPayload {
    pub absolute_name: String,
    addresses: Vec<String>,
    pub ttl: Option<u32>,
}

impl HostRecordPayload {
    pub fn get_addresses_list(&self) -> &[String] {
        &self.addresses
    }
}

impl RowPayload for HostRecordPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let absolute_name = normalize_fqdn(fields.required(row_id, "absolute_name", &mut errors));
        let addresses = fields.list("addresses");
        if addresses.is_empty() {
            errors.push(ValidationError::missing(row_id, "addresses"));
        }
        let ttl = fields.optional("ttl").map(|raw| {
            raw.parse::<u32>().unwrap_or_else(|_| {
                errors.push(ValidationError::new(row_id, "ttl", format!("`{raw}` is not a valid TTL")));
                0
            })
        });
        (
            Self { absolute_name, addresses, ttl },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRecordPayload {
    pub absolute_name: String,
    pub linked_record: String,
    pub priority: u16,
}

impl RowPayload for MxRecordPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let absolute_name = normalize_fqdn(fields.required(row_id, "absolute_name", &mut errors));
        let linked_record = fields.required(row_id, "linked_record", &mut errors).to_string();
        let priority_raw = fields.required(row_id, "priority", &mut errors);
        let priority = priority_raw.parse::<u16>().unwrap_or_else(|_| {
            if !priority_raw.is_empty() {
                errors.push(ValidationError::new(row_id, "priority", format!("`{priority_raw}` is not a valid priority")));
            }
            0
        });
        (
            Self { absolute_name, linked_record, priority },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvRecordPayload {
    pub absolute_name: String,
    pub linked_record: String,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

impl RowPayload for SrvRecordPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let absolute_name = normalize_fqdn(fields.required(row_id, "absolute_name", &mut errors));
        let linked_record = fields.required(row_id, "linked_record", &mut errors).to_string();
        let parse_u16 = |field: &str, errors: &mut Vec<ValidationError>| {
            let raw = fields.required(row_id, field, errors);
            raw.parse::<u16>().unwrap_or_else(|_| {
                if !raw.is_empty() {
                    errors.push(ValidationError::new(row_id, field, format!("`{raw}` is not a valid {field}")));
                }
                0
            })
        };
        let priority = parse_u16("priority", &mut errors);
        let weight = parse_u16("weight", &mut errors);
        let port = parse_u16("port", &mut errors);
        (
            Self { absolute_name, linked_record, priority, weight, port },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericRecordPayload {
    pub absolute_name: String,
    pub record_type: String,
    pub rdata: String,
    pub ttl: Option<u32>,
}

impl RowPayload for GenericRecordPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let absolute_name = normalize_fqdn(fields.required(row_id, "absolute_name", &mut errors));
        let record_type = fields.required(row_id, "record_type", &mut errors).to_string();
        let rdata = fields.required(row_id, "rdata", &mut errors).to_string();
        let ttl = fields.optional("ttl").map(|raw| {
            raw.parse::<u32>().unwrap_or_else(|_| {
                errors.push(ValidationError::new(row_id, "ttl", format!("`{raw}` is not a valid TTL")));
                0
            })
        });
        (
            Self { absolute_name, record_type, rdata, ttl },
            errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, &str)]) -> RowFields {
        RowFields::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn zone_strips_trailing_dot() {
        let (payload, errors) = DnsZonePayload::parse("r1", &fields(&[("absolute_name", "example.com.")]));
        assert!(errors.is_empty());
        assert_eq!(payload.absolute_name, "example.com");
    }

    #[test]
    fn host_record_requires_at_least_one_address() {
        let (_, errors) = HostRecordPayload::parse("r1", &fields(&[("absolute_name", "www.example.com")]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "addresses");
    }

    #[test]
    fn host_record_parses_pipe_delimited_addresses() {
        let (payload, errors) = HostRecordPayload::parse(
            "r1",
            &fields(&[("absolute_name", "www.example.com"), ("addresses", "10.0.1.5|10.0.1.6")]),
        );
        assert!(errors.is_empty());
        assert_eq!(payload.get_addresses_list(), ["10.0.1.5", "10.0.1.6"]);
    }
}
