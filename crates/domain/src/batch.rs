//! Batch item types sent to the bulk-ingestion endpoints

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Which of the two batch endpoints a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Objects,
    References,
}

impl BatchKind {
    /// Data type name used in paths and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::References => "references",
        }
    }

    /// REST path relative to the API version prefix.
    pub fn path(self) -> &'static str {
        match self {
            Self::Objects => "/batch/objects",
            Self::References => "/batch/references",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectItem {
    #[serde(rename = "class")]
    pub class_name: String,
    pub properties: Map<String, Value>,
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// One cross-reference link between two beacons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub from: String,
    pub to: String,
}
