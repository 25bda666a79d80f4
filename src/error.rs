//! Error types for catalog resolution and document editing.

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate protocol id: {0}")]
    DuplicateProtocol(String),
    #[error("Duplicate field id {field} in protocol {protocol}")]
    DuplicateField { protocol: String, field: String },
    #[error("Duplicate field-engine parameter id: {0}")]
    DuplicateParameter(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Empty layer path")]
    EmptyPath,
    #[error("Layer path of depth {depth} exceeds stack of {stack_len} layer(s)")]
    PathOutOfBounds { depth: usize, stack_len: usize },
    #[error("Layer position {position} outside stack of {stack_len} layer(s)")]
    LayerOutOfBounds { position: usize, stack_len: usize },
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),
    #[error("Unknown field-engine parameter: {0}")]
    UnknownParameter(String),
    #[error("No field-engine instruction for field {field} in protocol {protocol}")]
    InstructionNotFound { protocol: String, field: String },
    #[error("Serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}
