//! Test descriptors handed to the recorder at collection time.
//!
//! The declared-metadata lookup is an explicit capability: a descriptor that
//! carries author metadata returns a [`DeclaresMetadata`] from
//! [`TestDescriptor::metadata_source`]; the recorder never probes for it otherwise.

use crate::errors::MetadataError;
use crate::model::DeclaredAttributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read access to metadata attached to a test definition.
pub trait DeclaresMetadata {
    fn declared_metadata(&self) -> Result<DeclaredAttributes, MetadataError>;
}

/// A discovered test as seen by the recorder.
pub trait TestDescriptor {
    /// Stable identity assigned by the host engine.
    fn nodeid(&self) -> &str;

    /// Short display name.
    fn name(&self) -> &str;

    fn metadata_source(&self) -> Option<&dyn DeclaresMetadata> {
        None
    }
}

/// Plain descriptor used by the host adapters and in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedTest {
    pub nodeid: String,
    pub name: String,
    /// Raw attached metadata; must be a JSON object when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl CollectedTest {
    pub fn new(nodeid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            nodeid: nodeid.into(),
            name: name.into(),
            meta: None,
        }
    }

    /// Descriptor whose short name is the last `::` segment of the identity.
    pub fn from_nodeid(nodeid: impl Into<String>) -> Self {
        let nodeid = nodeid.into();
        let name = short_name(&nodeid).to_string();
        Self::new(nodeid, name)
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl TestDescriptor for CollectedTest {
    fn nodeid(&self) -> &str {
        &self.nodeid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn metadata_source(&self) -> Option<&dyn DeclaresMetadata> {
        self.meta.as_ref().map(|_| self as &dyn DeclaresMetadata)
    }
}

impl DeclaresMetadata for CollectedTest {
    fn declared_metadata(&self) -> Result<DeclaredAttributes, MetadataError> {
        match &self.meta {
            None => Ok(DeclaredAttributes::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(MetadataError::NotAMapping {
                found: json_kind(other),
            }),
        }
    }
}

pub fn short_name(nodeid: &str) -> &str {
    nodeid.rsplit("::").next().unwrap_or(nodeid)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
