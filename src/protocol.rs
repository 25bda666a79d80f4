//! Protocol layers of a document and the fields and instructions they own.

use crate::catalog::FeInstructionParameterMeta;
use crate::error::DocumentError;
use crate::value::FieldValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// One editable field inside a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UserField {
    id: String,
    value: Option<FieldValue>,
    display_value: Option<String>,
}

impl UserField {
    pub fn new(id: impl Into<String>) -> Self {
        UserField {
            id: id.into(),
            value: None,
            display_value: None,
        }
    }

    pub fn with_value(id: impl Into<String>, value: Option<FieldValue>) -> Self {
        UserField {
            id: id.into(),
            value,
            display_value: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// Replace the value and return the previous one. Drops the cached display string.
    pub fn set_value(&mut self, value: Option<FieldValue>) -> Option<FieldValue> {
        self.display_value = None;
        std::mem::replace(&mut self.value, value)
    }

    pub fn display_value(&self) -> Option<&str> {
        self.display_value.as_deref()
    }

    pub fn set_display_value(&mut self, display: impl Into<String>) {
        self.display_value = Some(display.into());
    }
}

/// Mutation applied by the field engine at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    #[default]
    Inc,
    Dec,
    Random,
}

/// Layer-scoped field-engine instruction, keyed by the field it drives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeInstruction {
    #[serde(rename = "id")]
    pub field_id: String,
    #[serde(rename = "op")]
    pub kind: InstructionKind,
    pub parameters: BTreeMap<String, String>,
}

impl FeInstruction {
    pub fn new(field_id: impl Into<String>) -> Self {
        FeInstruction {
            field_id: field_id.into(),
            kind: InstructionKind::default(),
            parameters: BTreeMap::new(),
        }
    }
}

/// One protocol instance in the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProtocol {
    id: String,
    path: Vec<String>,
    /// Unique by id; catalog declaration order, ad-hoc fields appended.
    fields: Vec<UserField>,
    instructions: Vec<FeInstruction>,
}

impl UserProtocol {
    pub fn new(id: impl Into<String>, path: Vec<String>) -> Self {
        UserProtocol {
            id: id.into(),
            path,
            fields: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of the layers from the stack bottom up to and including this one, as of creation.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn fields(&self) -> &[UserField] {
        &self.fields
    }

    /// Fields that currently hold a value.
    pub fn set_fields(&self) -> impl Iterator<Item = &UserField> {
        self.fields.iter().filter(|f| f.value.is_some())
    }

    pub fn field(&self, id: &str) -> Option<&UserField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut UserField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Insert a field, replacing any existing field with the same id in place.
    pub fn add_field(&mut self, field: UserField) {
        match self.fields.iter().position(|f| f.id == field.id) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
    }

    /// Return the field with this id, creating an unset one if absent.
    pub fn create_field(&mut self, id: &str) -> &mut UserField {
        let idx = match self.fields.iter().position(|f| f.id == id) {
            Some(i) => i,
            None => {
                self.fields.push(UserField::new(id));
                self.fields.len() - 1
            }
        };
        &mut self.fields[idx]
    }

    pub fn delete_field(&mut self, id: &str) -> Option<UserField> {
        let idx = self.fields.iter().position(|f| f.id == id)?;
        Some(self.fields.remove(idx))
    }

    pub fn instructions(&self) -> &[FeInstruction] {
        &self.instructions
    }

    pub fn instruction(&self, field_id: &str) -> Option<&FeInstruction> {
        self.instructions.iter().find(|i| i.field_id == field_id)
    }

    /// Create the instruction for a field, seeding declared parameter defaults.
    /// An existing instruction for the field is returned unchanged.
    pub fn create_field_instruction(
        &mut self,
        field_id: &str,
        parameter_defaults: &[FeInstructionParameterMeta],
    ) -> &mut FeInstruction {
        let idx = match self.instructions.iter().position(|i| i.field_id == field_id) {
            Some(i) => i,
            None => {
                let mut instruction = FeInstruction::new(field_id);
                for meta in parameter_defaults {
                    instruction.parameters.insert(meta.id.clone(), meta.default.clone());
                }
                self.instructions.push(instruction);
                self.instructions.len() - 1
            }
        };
        &mut self.instructions[idx]
    }

    pub fn delete_field_instruction(&mut self, field_id: &str) -> Option<FeInstruction> {
        let idx = self.instructions.iter().position(|i| i.field_id == field_id)?;
        Some(self.instructions.remove(idx))
    }

    fn instruction_mut(&mut self, field_id: &str) -> Result<&mut FeInstruction, DocumentError> {
        let protocol = self.id.clone();
        self.instructions
            .iter_mut()
            .find(|i| i.field_id == field_id)
            .ok_or_else(|| DocumentError::InstructionNotFound {
                protocol,
                field: field_id.to_string(),
            })
    }

    pub fn set_field_instruction(
        &mut self,
        field_id: &str,
        parameter_id: &str,
        value: impl Into<String>,
    ) -> Result<(), DocumentError> {
        self.instruction_mut(field_id)?
            .parameters
            .insert(parameter_id.to_string(), value.into());
        Ok(())
    }

    pub fn set_field_instruction_kind(
        &mut self,
        field_id: &str,
        kind: InstructionKind,
    ) -> Result<(), DocumentError> {
        self.instruction_mut(field_id)?.kind = kind;
        Ok(())
    }
}
