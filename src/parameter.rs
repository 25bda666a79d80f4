//! Global field-engine parameters and document-scoped instruction expressions.

use crate::catalog::FeParameterMeta;
use serde::Serialize;
use std::collections::BTreeMap;

/// Id of the parameter that names a layer to split generated flows by.
pub const SPLIT_BY_PARAMETER: &str = "split_by_var";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeParameter {
    meta: FeParameterMeta,
    value: String,
}

impl FeParameter {
    pub fn new(meta: FeParameterMeta, value: impl Into<String>) -> Self {
        FeParameter {
            meta,
            value: value.into(),
        }
    }

    /// Parameter with the declared default as its value.
    pub fn from_meta(meta: &FeParameterMeta) -> Self {
        FeParameter::new(meta.clone(), meta.default.clone())
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn meta(&self) -> &FeParameterMeta {
        &self.meta
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// A split-by parameter goes stale when the layer it names changes.
    pub fn references_layer(&self, layer_id: &str) -> bool {
        self.meta.id == SPLIT_BY_PARAMETER
            && self.value.to_lowercase().contains(&layer_id.to_lowercase())
    }
}

/// Free-standing instruction staged at document level, matched by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionExpression {
    pub id: String,
    pub parameters: BTreeMap<String, String>,
}

impl InstructionExpression {
    pub fn new(id: impl Into<String>) -> Self {
        InstructionExpression {
            id: id.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(id.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_by_match_is_case_insensitive() {
        let mut p = FeParameter::from_meta(&FeParameterMeta::new(SPLIT_BY_PARAMETER, ""));
        assert!(!p.references_layer("ip"));
        p.set_value("contains-IP-token");
        assert!(p.references_layer("ip"));
        assert!(p.references_layer("Ip"));
        assert!(!p.references_layer("tcp"));
    }

    #[test]
    fn only_split_by_references_layers() {
        let p = FeParameter::new(FeParameterMeta::new("rate", ""), "IP");
        assert!(!p.references_layer("ip"));
    }
}
