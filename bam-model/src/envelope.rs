//! The structural part of a row shared by every `object_type`: `row_id`,
//! `action`, and the optional `config`/`view` parent references. Each row
//! variant's typed payload is layered on top of this (see the "sum types
//! vs. dynamic rows" design note).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RowAction::Create => "create",
            RowAction::Update => "update",
            RowAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("`{0}` is not a recognized action (expected create, update, or delete)")]
pub struct UnknownAction(pub String);

impl std::str::FromStr for RowAction {
    type Err = UnknownAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(RowAction::Create),
            "update" => Ok(RowAction::Update),
            "delete" => Ok(RowAction::Delete),
            _ => Err(UnknownAction(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowEnvelope {
    pub row_id: String,
    pub action: RowAction,
    pub config: Option<String>,
    pub view: Option<String>,
}

impl RowEnvelope {
    pub fn new(row_id: impl Into<String>, action: RowAction) -> Self {
        Self {
            row_id: row_id.into(),
            action,
            config: None,
            view: None,
        }
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}
