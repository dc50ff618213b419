//! Location, user-defined field/link, tag, ACL, and access-right payloads.

use bam_util::normalize::{normalize_access_level, normalize_user_type};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{RowFields, RowPayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationPayload {
    pub name: String,
}

impl RowPayload for ConfigurationPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (Self { name }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPayload {
    pub name: String,
}

impl RowPayload for ViewPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (Self { name }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPayload {
    pub name: String,
    pub parent_location: Option<String>,
}

impl RowPayload for LocationPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (
            Self {
                name,
                parent_location: fields.optional("parent_location").map(str::to_owned),
            },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfDefinitionPayload {
    pub name: String,
    pub field_type: String,
    pub applies_to: String,
}

impl RowPayload for UdfDefinitionPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let field_type = fields.required(row_id, "field_type", &mut errors).to_string();
        let applies_to = fields.required(row_id, "applies_to", &mut errors).to_string();
        (Self { name, field_type, applies_to }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdlDefinitionPayload {
    pub name: String,
    pub from_type: String,
    pub to_type: String,
}

impl RowPayload for UdlDefinitionPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let from_type = fields.required(row_id, "from_type", &mut errors).to_string();
        let to_type = fields.required(row_id, "to_type", &mut errors).to_string();
        (Self { name, from_type, to_type }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefinedLinkPayload {
    pub link_name: String,
    pub from_resource: String,
    pub to_resource: String,
}

impl RowPayload for UserDefinedLinkPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let link_name = fields.required(row_id, "link_name", &mut errors).to_string();
        let from_resource = fields.required(row_id, "from_resource", &mut errors).to_string();
        let to_resource = fields.required(row_id, "to_resource", &mut errors).to_string();
        (
            Self { link_name, from_resource, to_resource },
            errors,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroupPayload {
    pub name: String,
}

impl RowPayload for TagGroupPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        (Self { name }, errors)
    }
}

/// Immutable once created: the handler rejects `update` (idiom 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPayload {
    pub name: String,
    pub parent_tag_group: String,
}

impl RowPayload for TagPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let parent_tag_group = fields.required(row_id, "parent_tag_group", &mut errors).to_string();
        (Self { name, parent_tag_group }, errors)
    }
}

/// Immutable link between a tag and a resource (update idiom 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTagPayload {
    pub tag: String,
    pub resource: String,
}

impl RowPayload for ResourceTagPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let tag = fields.required(row_id, "tag", &mut errors).to_string();
        let resource = fields.required(row_id, "resource", &mut errors).to_string();
        (Self { tag, resource }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPayload {
    pub name: String,
    pub resource: String,
}

impl RowPayload for AclPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let name = fields.required(row_id, "name", &mut errors).to_string();
        let resource = fields.required(row_id, "resource", &mut errors).to_string();
        (Self { name, resource }, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRightPayload {
    pub user_or_group: String,
    pub user_type: String,
    pub resource: String,
    pub access_level: String,
}

impl RowPayload for AccessRightPayload {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let user_or_group = fields.required(row_id, "user_or_group", &mut errors).to_string();
        let user_type = normalize_user_type(fields.required(row_id, "user_type", &mut errors));
        let resource = fields.required(row_id, "resource", &mut errors).to_string();
        let access_level = normalize_access_level(fields.required(row_id, "access_level", &mut errors));
        (
            Self {
                user_or_group,
                user_type,
                resource,
                access_level,
            },
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
    fn access_right_normalizes_case() {
        let (payload, errors) = AccessRightPayload::parse(
            "r1",
            &fields(&[
                ("user_or_group", "alice"),
                ("user_type", "USER"),
                ("resource", "Default/10.0.0.0/8"),
                ("access_level", "full"),
            ]),
        );
        assert!(errors.is_empty());
        assert_eq!(payload.user_type, "user");
        assert_eq!(payload.access_level, "FULL");
    }
}
