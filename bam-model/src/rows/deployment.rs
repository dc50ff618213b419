//! Deployment-role and DHCP option payloads.
//!
//! Deployment roles may reference server interfaces that are themselves
//! remote resources created elsewhere in the same run; the planner resolves
//! that via a deferred reference rather than a graph cycle (see the design
//! note on cycles via back-references), so these payloads carry the raw
//! `server_interface` identity string rather than a resolved id.

use bam_util::normalize::{validate_dhcp_option_code, validate_server_scope};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{RowFields, RowPayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpDeploymentRolePayload {
    pub server_interface: String,
    pub role: String,
}

impl RowPayload for DhcpDeploymentRolePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let server_interface = fields.required(row_id, "server_interface", &mut errors).to_string();
        let role = fields.required(row_id, "role", &mut errors).to_string();
        (Self { server_interface, role }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsDeploymentRolePayload {
    pub server_interface: String,
    pub role: String,
    pub view: Option<String>,
}

impl RowPayload for DnsDeploymentRolePayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let server_interface = fields.required(row_id, "server_interface", &mut errors).to_string();
        let role = fields.required(row_id, "role", &mut errors).to_string();
        (
            Self {
                server_interface,
                role,
                view: fields.optional("view").map(str::to_owned),
            },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dhcpv4ClientDeploymentOptionPayload {
    pub option_code: u8,
    pub option_value: String,
    pub server_scope: String,
}

impl RowPayload for Dhcpv4ClientDeploymentOptionPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let code_raw = fields.required(row_id, "option_code", &mut errors);
        let option_code = validate_dhcp_option_code(code_raw).unwrap_or_else(|message| {
            if !code_raw.is_empty() {
                errors.push(ValidationError::new(row_id, "option_code", message));
            }
            0
        });
        let option_value = fields.required(row_id, "option_value", &mut errors).to_string();
        let scope_raw = fields.required(row_id, "server_scope", &mut errors);
        let server_scope = validate_server_scope(scope_raw).unwrap_or_else(|message| {
            if !scope_raw.is_empty() {
                errors.push(ValidationError::new(row_id, "server_scope", message));
            }
            scope_raw.to_string()
        });
        (
            Self { option_code, option_value, server_scope },
            errors,
        )
    }
}

pub type Dhcpv4ServiceDeploymentOptionPayload = Dhcpv4ClientDeploymentOptionPayload;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, &str)]) -> RowFields {
        RowFields::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn dhcp_option_validates_scope_and_code() {
        let (payload, errors) = Dhcpv4ClientDeploymentOptionPayload::parse(
            "r1",
            &fields(&[("option_code", "66"), ("option_value", "tftp.example.com"), ("server_scope", "Server-Wide")]),
        );
        assert!(errors.is_empty());
        assert_eq!(payload.option_code, 66);
        assert_eq!(payload.server_scope, "server-wide");
    }
}
