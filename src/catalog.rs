//! Field catalog: read-only protocol, field and field-engine declarations.
//!
//! The catalog is loaded elsewhere and handed to the document as immutable input.

use crate::error::CatalogError;
use crate::value::FieldValue;
use std::collections::{HashMap, HashSet};

/// Editor control family for a field. Only dispatched on by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Enum,
    MacAddress,
    Ipv4Address,
    Number,
    String,
    Bitmask,
    None,
}

/// One named sub-field of a bitmask field.
#[derive(Debug, Clone, PartialEq)]
pub struct BitFlagMetadata {
    pub name: String,
    pub mask: u32,
    /// Display name -> masked value, in declaration order.
    pub values: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
    pub default: Option<FieldValue>,
    pub bits: Vec<BitFlagMetadata>,
    /// Enum dictionary: display name -> value, in declaration order.
    pub dictionary: Vec<(String, FieldValue)>,
}

impl FieldMetadata {
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        let id = id.into();
        FieldMetadata {
            name: id.clone(),
            id,
            field_type,
            default: None,
            bits: Vec::new(),
            dictionary: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_bits(mut self, bits: Vec<BitFlagMetadata>) -> Self {
        self.bits = bits;
        self
    }

    pub fn with_dictionary(mut self, dictionary: Vec<(String, FieldValue)>) -> Self {
        self.dictionary = dictionary;
        self
    }
}

/// Ordered field declarations of one protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolMetadata {
    pub id: String,
    pub name: String,
    pub fields: Vec<FieldMetadata>,
}

impl ProtocolMetadata {
    pub fn new(id: impl Into<String>, fields: Vec<FieldMetadata>) -> Self {
        let id = id.into();
        ProtocolMetadata {
            name: id.clone(),
            id,
            fields,
        }
    }

    pub fn field(&self, id: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Declaration of a global field-engine parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeParameterMeta {
    pub id: String,
    pub name: String,
    pub default: String,
}

impl FeParameterMeta {
    pub fn new(id: impl Into<String>, default: impl Into<String>) -> Self {
        let id = id.into();
        FeParameterMeta {
            name: id.clone(),
            id,
            default: default.into(),
        }
    }
}

/// Declaration of a per-instruction parameter (min/max/step and so on).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeInstructionParameterMeta {
    pub id: String,
    pub name: String,
    pub default: String,
}

impl FeInstructionParameterMeta {
    pub fn new(id: impl Into<String>, default: impl Into<String>) -> Self {
        let id = id.into();
        FeInstructionParameterMeta {
            name: id.clone(),
            id,
            default: default.into(),
        }
    }
}

/// Resolved catalog: protocols by id plus field-engine declarations.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    protocols: Vec<ProtocolMetadata>,
    protocols_by_id: HashMap<String, usize>,
    fe_parameters: Vec<FeParameterMeta>,
    instruction_parameters: Vec<FeInstructionParameterMeta>,
}

impl Catalog {
    /// Index the declarations, rejecting duplicate protocol, field and parameter ids.
    pub fn resolve(
        protocols: Vec<ProtocolMetadata>,
        fe_parameters: Vec<FeParameterMeta>,
        instruction_parameters: Vec<FeInstructionParameterMeta>,
    ) -> Result<Self, CatalogError> {
        let mut protocols_by_id = HashMap::new();
        for (i, p) in protocols.iter().enumerate() {
            if protocols_by_id.insert(p.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateProtocol(p.id.clone()));
            }
            let mut seen = HashSet::new();
            for f in &p.fields {
                if !seen.insert(f.id.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        protocol: p.id.clone(),
                        field: f.id.clone(),
                    });
                }
            }
        }
        let mut seen = HashSet::new();
        for p in &fe_parameters {
            if !seen.insert(p.id.as_str()) {
                return Err(CatalogError::DuplicateParameter(p.id.clone()));
            }
        }
        Ok(Catalog {
            protocols,
            protocols_by_id,
            fe_parameters,
            instruction_parameters,
        })
    }

    pub fn protocol(&self, id: &str) -> Option<&ProtocolMetadata> {
        self.protocols_by_id.get(id).map(|&i| &self.protocols[i])
    }

    pub fn protocols(&self) -> &[ProtocolMetadata] {
        &self.protocols
    }

    pub fn fe_parameters(&self) -> &[FeParameterMeta] {
        &self.fe_parameters
    }

    pub fn instruction_parameters(&self) -> &[FeInstructionParameterMeta] {
        &self.instruction_parameters
    }
}
