//! The packet document: layer stack, field edits with single-level undo, and the
//! field-engine parameter and instruction registries.
//!
//! The document may be partially invalid while the user edits it. Nothing here checks field
//! values against protocol semantics; compiling (see [`crate::compile`]) snapshots whatever
//! state is present.

use crate::catalog::{Catalog, FeInstructionParameterMeta, FeParameterMeta, ProtocolMetadata};
use crate::error::DocumentError;
use crate::parameter::{FeParameter, InstructionExpression};
use crate::protocol::{FeInstruction, InstructionKind, UserField, UserProtocol};
use crate::value::FieldValue;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Opaque key/value metadata stored with the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    entries: BTreeMap<String, String>,
}

impl DocumentMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The most recent field edit: which field, and what it held before.
#[derive(Debug, Clone, PartialEq)]
struct UndoRecord {
    layer: usize,
    field_id: String,
    previous: Option<FieldValue>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    protocols: Vec<UserProtocol>,
    metadata: DocumentMetadata,
    fe_parameters: HashMap<String, FeParameter>,
    current_file: Option<PathBuf>,
    undo: Option<UndoRecord>,
    fe_instructions: Vec<InstructionExpression>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }

    pub fn set_metadata(&mut self, metadata: DocumentMetadata) {
        self.metadata = metadata;
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn set_current_file(&mut self, file: Option<PathBuf>) {
        self.current_file = file;
    }

    // ==================== Layer stack ====================

    /// Push a new layer on top of the stack, seeding every declared field with its default.
    pub fn add_protocol(&mut self, meta: &ProtocolMetadata) -> &UserProtocol {
        let mut path: Vec<String> = self.protocols.iter().map(|p| p.id().to_string()).collect();
        path.push(meta.id.clone());
        let mut protocol = UserProtocol::new(meta.id.clone(), path);
        for field in &meta.fields {
            protocol.add_field(UserField::with_value(field.id.clone(), field.default.clone()));
        }
        debug!(protocol = %meta.id, depth = self.protocols.len() + 1, "push layer");
        self.protocols.push(protocol);
        &self.protocols[self.protocols.len() - 1]
    }

    /// Push the catalog's declaration for `protocol_id`.
    pub fn push_from_catalog(
        &mut self,
        catalog: &Catalog,
        protocol_id: &str,
    ) -> Result<&UserProtocol, DocumentError> {
        let meta = catalog
            .protocol(protocol_id)
            .ok_or_else(|| DocumentError::UnknownProtocol(protocol_id.to_string()))?;
        Ok(self.add_protocol(meta))
    }

    /// Remove the top layer with its fields and instructions.
    pub fn pop(&mut self) -> Option<UserProtocol> {
        let removed = self.protocols.pop()?;
        if self.undo.as_ref().is_some_and(|u| u.layer >= self.protocols.len()) {
            self.undo = None;
        }
        debug!(protocol = %removed.id(), depth = self.protocols.len(), "pop layer");
        Some(removed)
    }

    pub fn clear(&mut self) {
        debug!(layers = self.protocols.len(), "clear stack");
        self.protocols.clear();
        self.undo = None;
    }

    pub fn protocols(&self) -> &[UserProtocol] {
        &self.protocols
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn top(&self) -> Option<&UserProtocol> {
        self.protocols.last()
    }

    /// Layer at 1-based `position` from the bottom of the stack.
    pub fn layer(&self, position: usize) -> Result<&UserProtocol, DocumentError> {
        if position == 0 || position > self.protocols.len() {
            return Err(DocumentError::LayerOutOfBounds {
                position,
                stack_len: self.protocols.len(),
            });
        }
        Ok(&self.protocols[position - 1])
    }

    /// Path recorded for the layer at 1-based `position`.
    pub fn path_of(&self, position: usize) -> Result<&[String], DocumentError> {
        self.layer(position).map(UserProtocol::path)
    }

    /// A path addresses its layer by length: `[a, b]` is the second layer.
    fn index_for_path<S: AsRef<str>>(&self, path: &[S]) -> Result<usize, DocumentError> {
        match path.len() {
            0 => Err(DocumentError::EmptyPath),
            depth if depth > self.protocols.len() => Err(DocumentError::PathOutOfBounds {
                depth,
                stack_len: self.protocols.len(),
            }),
            depth => Ok(depth - 1),
        }
    }

    pub fn protocol_by_path<S: AsRef<str>>(&self, path: &[S]) -> Result<&UserProtocol, DocumentError> {
        let idx = self.index_for_path(path)?;
        Ok(&self.protocols[idx])
    }

    fn protocol_by_path_mut<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Result<(usize, &mut UserProtocol), DocumentError> {
        let idx = self.index_for_path(path)?;
        Ok((idx, &mut self.protocols[idx]))
    }

    // ==================== Field values and undo ====================

    /// Set a field's value, creating the field if the layer does not have it yet.
    /// The previous value replaces whatever the undo slot held.
    pub fn set_field_value<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), DocumentError> {
        let value = value.into();
        let (idx, protocol) = self.protocol_by_path_mut(path)?;
        trace!(protocol = %protocol.id(), field = field_id, %value, "set field value");
        let previous = protocol.create_field(field_id).set_value(Some(value));
        self.undo = Some(UndoRecord {
            layer: idx,
            field_id: field_id.to_string(),
            previous,
        });
        Ok(())
    }

    /// Remove a field from the addressed layer. Absent fields are ignored.
    pub fn delete_field<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
    ) -> Result<Option<UserField>, DocumentError> {
        let (idx, protocol) = self.protocol_by_path_mut(path)?;
        let removed = protocol.delete_field(field_id);
        if self
            .undo
            .as_ref()
            .is_some_and(|u| u.layer == idx && u.field_id == field_id)
        {
            self.undo = None;
        }
        Ok(removed)
    }

    /// Restore the field touched by the last edit. Returns whether anything was restored;
    /// the undo slot is empty afterwards either way.
    pub fn revert_last_change(&mut self) -> bool {
        let Some(record) = self.undo.take() else {
            return false;
        };
        let field = self
            .protocols
            .get_mut(record.layer)
            .and_then(|p| p.field_mut(&record.field_id));
        match field {
            Some(field) => {
                debug!(field = %record.field_id, "revert last change");
                field.set_value(record.previous);
                true
            }
            None => false,
        }
    }

    pub fn can_revert(&self) -> bool {
        self.undo.is_some()
    }

    // ==================== Layer-scoped instructions ====================

    /// Attach a field-engine instruction to `field_id`, seeding `defaults` as its parameters.
    pub fn create_instruction<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
        defaults: &[FeInstructionParameterMeta],
    ) -> Result<&FeInstruction, DocumentError> {
        let (_, protocol) = self.protocol_by_path_mut(path)?;
        debug!(protocol = %protocol.id(), field = field_id, "create instruction");
        Ok(protocol.create_field_instruction(field_id, defaults))
    }

    pub fn delete_instruction<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
    ) -> Result<Option<FeInstruction>, DocumentError> {
        let (_, protocol) = self.protocol_by_path_mut(path)?;
        debug!(protocol = %protocol.id(), field = field_id, "delete instruction");
        Ok(protocol.delete_field_instruction(field_id))
    }

    pub fn set_instruction_parameter<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
        parameter_id: &str,
        value: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let (_, protocol) = self.protocol_by_path_mut(path)?;
        protocol.set_field_instruction(field_id, parameter_id, value)
    }

    pub fn set_instruction_kind<S: AsRef<str>>(
        &mut self,
        path: &[S],
        field_id: &str,
        kind: InstructionKind,
    ) -> Result<(), DocumentError> {
        let (_, protocol) = self.protocol_by_path_mut(path)?;
        protocol.set_field_instruction_kind(field_id, kind)
    }

    // ==================== Document-scoped instructions ====================

    pub fn instruction_expressions(&self) -> &[InstructionExpression] {
        &self.fe_instructions
    }

    pub fn add_instruction_expression(&mut self, expression: InstructionExpression) {
        self.fe_instructions.push(expression);
    }

    /// Remove the first expression equal to `expression`.
    pub fn delete_instruction_expression(&mut self, expression: &InstructionExpression) -> bool {
        match self.fe_instructions.iter().position(|e| e == expression) {
            Some(i) => {
                self.fe_instructions.remove(i);
                true
            }
            None => false,
        }
    }

    // ==================== Global parameters ====================

    /// Create one parameter per declaration with its default value. Merges into the
    /// registry; an id already present is overwritten.
    pub fn init_parameters<'a>(&mut self, metas: impl IntoIterator<Item = &'a FeParameterMeta>) {
        for meta in metas {
            self.fe_parameters
                .insert(meta.id.clone(), FeParameter::from_meta(meta));
        }
        debug!(parameters = self.fe_parameters.len(), "init parameters");
    }

    pub fn create_parameter(&mut self, meta: FeParameterMeta, value: impl Into<String>) {
        let id = meta.id.clone();
        self.fe_parameters.insert(id, FeParameter::new(meta, value));
    }

    pub fn clear_parameters(&mut self) {
        debug!(parameters = self.fe_parameters.len(), "clear parameters");
        self.fe_parameters.clear();
    }

    pub fn set_parameter_value(&mut self, id: &str, value: impl Into<String>) -> Result<(), DocumentError> {
        let parameter = self
            .fe_parameters
            .get_mut(id)
            .ok_or_else(|| DocumentError::UnknownParameter(id.to_string()))?;
        parameter.set_value(value);
        Ok(())
    }

    pub fn parameter(&self, id: &str) -> Option<&FeParameter> {
        self.fe_parameters.get(id)
    }

    /// All parameters, sorted by id.
    pub fn parameters(&self) -> Vec<&FeParameter> {
        let mut out: Vec<&FeParameter> = self.fe_parameters.values().collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// Reset every split-by parameter whose value names `layer_id`. Call when that layer is
    /// removed or replaced. Returns how many were reset.
    pub fn clear_dependent_parameters(&mut self, layer_id: &str) -> usize {
        let mut reset = 0;
        for parameter in self.fe_parameters.values_mut() {
            if parameter.references_layer(layer_id) {
                debug!(parameter = %parameter.id(), layer = layer_id, "reset stale parameter");
                parameter.set_value("");
                reset += 1;
            }
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldMetadata, FieldType};
    use crate::parameter::SPLIT_BY_PARAMETER;

    fn ip() -> ProtocolMetadata {
        ProtocolMetadata::new(
            "IP",
            vec![
                FieldMetadata::new("ttl", FieldType::Number).with_default(64),
                FieldMetadata::new("proto", FieldType::Number).with_default(6),
            ],
        )
    }

    fn tcp() -> ProtocolMetadata {
        ProtocolMetadata::new(
            "TCP",
            vec![
                FieldMetadata::new("sport", FieldType::Number).with_default(0),
                FieldMetadata::new("dport", FieldType::Number).with_default(0),
            ],
        )
    }

    fn value_of<'a>(doc: &'a Document, path: &[&str], field: &str) -> Option<&'a FieldValue> {
        doc.protocol_by_path(path).ok()?.field(field)?.value()
    }

    #[test]
    fn push_records_path_and_defaults() {
        let mut doc = Document::new();
        doc.add_protocol(&ip());
        doc.add_protocol(&tcp());
        assert_eq!(doc.path_of(2).unwrap(), ["IP", "TCP"]);
        assert_eq!(value_of(&doc, &["IP"], "ttl"), Some(&FieldValue::Int(64)));
        assert_eq!(doc.top().map(UserProtocol::id), Some("TCP"));
    }

    #[test]
    fn path_bounds_are_checked() {
        let mut doc = Document::new();
        doc.add_protocol(&ip());
        let empty: [&str; 0] = [];
        assert!(matches!(doc.protocol_by_path(&empty), Err(DocumentError::EmptyPath)));
        assert!(matches!(
            doc.set_field_value(&["IP", "TCP"], "dport", "80"),
            Err(DocumentError::PathOutOfBounds { depth: 2, stack_len: 1 })
        ));
        assert!(matches!(doc.path_of(0), Err(DocumentError::LayerOutOfBounds { .. })));
        assert!(matches!(doc.path_of(2), Err(DocumentError::LayerOutOfBounds { .. })));
    }

    #[test]
    fn set_value_creates_ad_hoc_field() {
        let mut doc = Document::new();
        doc.add_protocol(&ip());
        doc.set_field_value(&["IP"], "options", FieldValue::Bytes(vec![1, 2])).unwrap();
        assert_eq!(doc.protocols()[0].fields().len(), 3);
        assert!(doc.revert_last_change());
        let f = doc.protocols()[0].field("options").expect("field kept");
        assert!(f.value().is_none());
    }

    #[test]
    fn revert_is_consumed_once() {
        let mut doc = Document::new();
        doc.add_protocol(&ip());
        doc.set_field_value(&["IP"], "ttl", "10").unwrap();
        doc.set_field_value(&["IP"], "ttl", "20").unwrap();
        assert!(doc.revert_last_change());
        assert_eq!(value_of(&doc, &["IP"], "ttl"), Some(&FieldValue::from("10")));
        assert!(!doc.revert_last_change());
        assert_eq!(value_of(&doc, &["IP"], "ttl"), Some(&FieldValue::from("10")));
    }

    #[test]
    fn pop_and_delete_drop_stale_undo() {
        let mut doc = Document::new();
        doc.add_protocol(&ip());
        doc.add_protocol(&tcp());
        doc.set_field_value(&["IP", "TCP"], "dport", "80").unwrap();
        doc.pop();
        assert!(!doc.can_revert());

        doc.set_field_value(&["IP"], "ttl", "1").unwrap();
        doc.delete_field(&["IP"], "ttl").unwrap();
        assert!(!doc.can_revert());
        assert!(doc.delete_field(&["IP"], "ttl").unwrap().is_none());
    }

    #[test]
    fn set_unknown_parameter_fails() {
        let mut doc = Document::new();
        let err = doc.set_parameter_value("rate", "10").unwrap_err();
        assert!(matches!(err, DocumentError::UnknownParameter(ref id) if id == "rate"));
    }

    #[test]
    fn init_parameters_merges() {
        let mut doc = Document::new();
        doc.init_parameters(&[FeParameterMeta::new("rate", "1")]);
        doc.set_parameter_value("rate", "5").unwrap();
        doc.init_parameters(&[FeParameterMeta::new(SPLIT_BY_PARAMETER, "")]);
        assert_eq!(doc.parameters().len(), 2);
        assert_eq!(doc.parameter("rate").map(FeParameter::value), Some("5"));

        doc.init_parameters(&[FeParameterMeta::new("rate", "1")]);
        assert_eq!(doc.parameter("rate").map(FeParameter::value), Some("1"));
        doc.clear_parameters();
        assert!(doc.parameters().is_empty());
    }

    #[test]
    fn instruction_expressions_delete_by_value() {
        let mut doc = Document::new();
        let a = InstructionExpression::new("STLVmFlowVar").with_parameter("name", "a");
        let b = InstructionExpression::new("STLVmFlowVar").with_parameter("name", "b");
        doc.add_instruction_expression(a.clone());
        doc.add_instruction_expression(b.clone());
        doc.add_instruction_expression(a.clone());
        assert!(doc.delete_instruction_expression(&a));
        assert_eq!(doc.instruction_expressions(), &[b, a]);
        assert!(!doc.delete_instruction_expression(&InstructionExpression::new("none")));
    }
}
