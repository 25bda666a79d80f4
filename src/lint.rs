//! Diagnostics over a document's edit state.
//!
//! A document is allowed to be inconsistent while it is being edited; these checks report
//! what would be surprising in the compiled output without blocking anything.
//!
//! ## Rules
//!
//! - **Orphan instruction**: a layer-scoped instruction drives a field the layer no longer owns.
//! - **Stale split-by**: the split-by parameter names no layer currently in the stack.
//! - **Ad-hoc field**: a field the catalog does not declare for its protocol.
//! - **Unset field**: a field without a value; it is left out of reconstruction.

use crate::catalog::Catalog;
use crate::document::Document;
use crate::parameter::SPLIT_BY_PARAMETER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintRule {
    OrphanInstruction,
    StaleSplitBy,
    AdHocField,
    UnsetField,
}

impl LintRule {
    pub fn id(self) -> &'static str {
        match self {
            LintRule::OrphanInstruction => "orphan-instruction",
            LintRule::StaleSplitBy => "stale-split-by",
            LintRule::AdHocField => "ad-hoc-field",
            LintRule::UnsetField => "unset-field",
        }
    }
}

/// A single finding. `layer` is the 1-based stack position, if the finding is layer-bound.
#[derive(Debug, Clone)]
pub struct LintMessage {
    pub layer: Option<usize>,
    pub field: Option<String>,
    pub rule: LintRule,
    pub severity: Severity,
    pub message: String,
}

/// Run all rules. Layer findings come first in stack order, parameter findings last.
/// Catalog-dependent rules are skipped without a catalog.
pub fn lint(doc: &Document, catalog: Option<&Catalog>) -> Vec<LintMessage> {
    let mut out = Vec::new();

    for (i, protocol) in doc.protocols().iter().enumerate() {
        let position = i + 1;
        let meta = catalog.and_then(|c| c.protocol(protocol.id()));

        for field in protocol.fields() {
            if let Some(meta) = meta {
                if meta.field(field.id()).is_none() {
                    out.push(LintMessage {
                        layer: Some(position),
                        field: Some(field.id().to_string()),
                        rule: LintRule::AdHocField,
                        severity: Severity::Warning,
                        message: format!("{} does not declare field {}", protocol.id(), field.id()),
                    });
                }
            }
            if field.value().is_none() {
                out.push(LintMessage {
                    layer: Some(position),
                    field: Some(field.id().to_string()),
                    rule: LintRule::UnsetField,
                    severity: Severity::Warning,
                    message: format!("{}.{} has no value", protocol.id(), field.id()),
                });
            }
        }

        for instruction in protocol.instructions() {
            if protocol.field(&instruction.field_id).is_none() {
                out.push(LintMessage {
                    layer: Some(position),
                    field: Some(instruction.field_id.clone()),
                    rule: LintRule::OrphanInstruction,
                    severity: Severity::Error,
                    message: format!(
                        "instruction on {}.{} targets a missing field",
                        protocol.id(),
                        instruction.field_id
                    ),
                });
            }
        }
    }

    if let Some(split_by) = doc.parameter(SPLIT_BY_PARAMETER) {
        let value = split_by.value().to_lowercase();
        let names_layer = doc
            .protocols()
            .iter()
            .any(|p| value.contains(&p.id().to_lowercase()));
        if !value.is_empty() && !names_layer {
            out.push(LintMessage {
                layer: None,
                field: None,
                rule: LintRule::StaleSplitBy,
                severity: Severity::Warning,
                message: format!("{} = {:?} names no layer in the stack", SPLIT_BY_PARAMETER, split_by.value()),
            });
        }
    }

    out
}
