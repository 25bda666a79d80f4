//! # packet-template: packet template document and field-engine compiler
//!
//! Editing model for a multi-layer packet template (e.g. Ether / IP / TCP / payload) with
//! field-engine instructions attached, plus the two passes that turn the mutable editing
//! state into backend descriptors.
//!
//! ## Model
//!
//! - **Catalog**: read-only protocol field declarations and field-engine parameter declarations
//! - **Document**: ordered layer stack, field values with single-level undo, global
//!   field-engine parameters, and a document-level list of staged instruction expressions
//! - **Layer** (`UserProtocol`): fields seeded from the catalog, plus per-field instructions
//!
//! ## Output
//!
//! - Reconstruction: `[{id, action: "modify", fields: [{id, kind: "human"|"raw", value}]}]`
//! - Field-engine program:
//!   `{field_engine: {instructions: [{id, fields: [...]}], global_parameters: {...}}}`
//!
//! ## Example
//!
//! ```
//! use packet_template::{Document, FieldMetadata, FieldType, ProtocolMetadata};
//!
//! let ip = ProtocolMetadata::new("IP", vec![
//!     FieldMetadata::new("ttl", FieldType::Number).with_default(64),
//! ]);
//! let mut doc = Document::new();
//! doc.add_protocol(&ip);
//! doc.set_field_value(&["IP"], "ttl", "32").unwrap();
//! doc.create_instruction(&["IP"], "ttl", &[]).unwrap();
//!
//! let layers = doc.compile_reconstruction();
//! assert_eq!(layers[0].fields[0].id(), "ttl");
//! let program = doc.compile_field_engine_program();
//! assert_eq!(program.field_engine.instructions.len(), 1);
//! ```

pub mod catalog;
pub mod compile;
pub mod document;
pub mod error;
pub mod lint;
pub mod parameter;
pub mod protocol;
pub mod value;

pub use catalog::{
    BitFlagMetadata, Catalog, FeInstructionParameterMeta, FeParameterMeta, FieldMetadata,
    FieldType, ProtocolMetadata,
};
pub use compile::{
    FieldEngine, FieldEngineProgram, ProtocolInstructions, ReconstructAction, ReconstructField,
    ReconstructProtocol,
};
pub use document::{Document, DocumentMetadata};
pub use error::{CatalogError, DocumentError};
pub use lint::{lint, LintMessage, LintRule, Severity};
pub use parameter::{FeParameter, InstructionExpression, SPLIT_BY_PARAMETER};
pub use protocol::{FeInstruction, InstructionKind, UserField, UserProtocol};
pub use value::FieldValue;
