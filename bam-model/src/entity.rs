//! The shape of a resource as returned by the remote API (C3/C4): a
//! positive integer id, a `type` discriminator, a kind-specific identity
//! field, and an arbitrary properties bag. IDs are opaque and
//! non-reusable within a session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind-specific field the API uses to name a resource, distinct from
/// its numeric `id`. The resolver's path-walk matches on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityField {
    Name(String),
    Range(String),
    Address(String),
    AbsoluteName(String),
}

impl IdentityField {
    pub fn as_str(&self) -> &str {
        match self {
            IdentityField::Name(s)
            | IdentityField::Range(s)
            | IdentityField::Address(s)
            | IdentityField::AbsoluteName(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    pub id: i64,
    #[serde(rename = "type")]
    pub object_type: String,
    pub identity: IdentityField,
    pub properties: Map<String, Value>,
}

impl RemoteEntity {
    pub fn new(id: i64, object_type: impl Into<String>, identity: IdentityField) -> Self {
        Self {
            id,
            object_type: object_type.into(),
            identity,
            properties: Map::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_field_exposes_inner_string_regardless_of_variant() {
        let byname = IdentityField::Name("Internal".to_string());
        let byrange = IdentityField::Range("10.0.1.10-10.0.1.20".to_string());
        assert_eq!(byname.as_str(), "Internal");
        assert_eq!(byrange.as_str(), "10.0.1.10-10.0.1.20");
    }

    #[test]
    fn ids_are_positive_and_opaque() {
        let entity = RemoteEntity::new(1042, "IPv4Block", IdentityField::Name("10.0.0.0/8".to_string()));
        assert!(entity.id > 0);
        assert_eq!(entity.object_type, "IPv4Block");
    }
}
