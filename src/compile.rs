//! Compile the editing state into the two backend descriptors.
//!
//! - Reconstruction: one `modify` entry per layer in stack order, with a delta for every
//!   field that holds a value. Primitives go out as human values for the backend to
//!   reinterpret by field type; structured values go out raw.
//! - Field-engine program: layer-scoped instructions of layers that have any, plus the
//!   global parameters whose value is non-empty.
//!
//! Both passes are read-only snapshots of the document.

use crate::document::Document;
use crate::error::DocumentError;
use crate::protocol::{FeInstruction, UserField, UserProtocol};
use crate::value::FieldValue;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

/// One field delta for the packet-construction backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructField {
    /// User-entered text, parsed by the backend per field type.
    Human { id: String, value: String },
    /// Structured value passed through verbatim.
    Raw { id: String, value: FieldValue },
}

impl ReconstructField {
    pub fn human(id: impl Into<String>, value: impl Into<String>) -> Self {
        ReconstructField::Human {
            id: id.into(),
            value: value.into(),
        }
    }

    pub fn raw(id: impl Into<String>, value: FieldValue) -> Self {
        ReconstructField::Raw { id: id.into(), value }
    }

    pub fn id(&self) -> &str {
        match self {
            ReconstructField::Human { id, .. } | ReconstructField::Raw { id, .. } => id,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, ReconstructField::Human { .. })
    }

    fn from_field(field: &UserField) -> Option<Self> {
        let value = field.value()?;
        Some(match value.as_human_string() {
            Some(text) => ReconstructField::human(field.id(), text),
            None => ReconstructField::raw(field.id(), value.clone()),
        })
    }
}

impl Serialize for ReconstructField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ReconstructField", 3)?;
        match self {
            ReconstructField::Human { id, value } => {
                s.serialize_field("id", id)?;
                s.serialize_field("kind", "human")?;
                s.serialize_field("value", value)?;
            }
            ReconstructField::Raw { id, value } => {
                s.serialize_field("id", id)?;
                s.serialize_field("kind", "raw")?;
                s.serialize_field("value", value)?;
            }
        }
        s.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconstructAction {
    Modify,
}

/// One layer of the reconstruction descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructProtocol {
    pub id: String,
    pub action: ReconstructAction,
    pub fields: Vec<ReconstructField>,
}

impl ReconstructProtocol {
    pub fn modify(id: impl Into<String>, fields: Vec<ReconstructField>) -> Self {
        ReconstructProtocol {
            id: id.into(),
            action: ReconstructAction::Modify,
            fields,
        }
    }

    fn from_protocol(protocol: &UserProtocol) -> Self {
        let fields = protocol
            .fields()
            .iter()
            .filter_map(ReconstructField::from_field)
            .collect();
        ReconstructProtocol::modify(protocol.id(), fields)
    }
}

/// Instructions of one layer in the field-engine program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolInstructions {
    pub id: String,
    pub fields: Vec<FeInstruction>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldEngine {
    pub instructions: Vec<ProtocolInstructions>,
    pub global_parameters: BTreeMap<String, String>,
}

/// Field-engine program descriptor for the traffic-generation backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldEngineProgram {
    pub field_engine: FieldEngine,
}

impl FieldEngineProgram {
    pub fn to_json(&self) -> Result<serde_json::Value, DocumentError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Document {
    /// Reconstruction descriptor: every layer in the stack, in stack order.
    pub fn compile_reconstruction(&self) -> Vec<ReconstructProtocol> {
        let out: Vec<ReconstructProtocol> = self
            .protocols()
            .iter()
            .map(ReconstructProtocol::from_protocol)
            .collect();
        debug!(layers = out.len(), "compiled reconstruction");
        out
    }

    pub fn reconstruction_json(&self) -> Result<serde_json::Value, DocumentError> {
        Ok(serde_json::to_value(self.compile_reconstruction())?)
    }

    /// Field-engine program: layers without instructions are left out entirely, and so are
    /// parameters with an empty value.
    pub fn compile_field_engine_program(&self) -> FieldEngineProgram {
        let instructions: Vec<ProtocolInstructions> = self
            .protocols()
            .iter()
            .filter(|p| !p.instructions().is_empty())
            .map(|p| ProtocolInstructions {
                id: p.id().to_string(),
                fields: p.instructions().to_vec(),
            })
            .collect();
        let global_parameters: BTreeMap<String, String> = self
            .parameters()
            .into_iter()
            .filter(|p| !p.value().is_empty())
            .map(|p| (p.id().to_string(), p.value().to_string()))
            .collect();
        debug!(
            layers = instructions.len(),
            parameters = global_parameters.len(),
            "compiled field-engine program"
        );
        FieldEngineProgram {
            field_engine: FieldEngine {
                instructions,
                global_parameters,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldMetadata, FieldType, ProtocolMetadata};
    use serde_json::json;

    #[test]
    fn human_and_raw_serialize_with_kind() {
        let h = ReconstructField::human("ttl", "32");
        assert_eq!(serde_json::to_value(&h).unwrap(), json!({ "id": "ttl", "kind": "human", "value": "32" }));
        let r = ReconstructField::raw("load", FieldValue::Bytes(vec![0xff]));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({ "id": "load", "kind": "raw", "value": { "vtype": "BYTES", "base64": "/w==" } })
        );
    }

    #[test]
    fn unset_fields_are_skipped() {
        let mut doc = Document::new();
        doc.add_protocol(&ProtocolMetadata::new(
            "Raw",
            vec![
                FieldMetadata::new("load", FieldType::String),
                FieldMetadata::new("len", FieldType::Number).with_default(0),
            ],
        ));
        let out = doc.compile_reconstruction();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].fields, vec![ReconstructField::human("len", "0")]);
    }

    #[test]
    fn empty_document_compiles_to_empty_program() {
        let doc = Document::new();
        assert!(doc.compile_reconstruction().is_empty());
        let program = doc.compile_field_engine_program().to_json().unwrap();
        assert_eq!(program, json!({ "field_engine": { "instructions": [], "global_parameters": {} } }));
    }
}
