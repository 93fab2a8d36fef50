//! Unified error model
use thiserror::Error;

/// Failures raised while constructing values, loading configuration or talking
/// to the storage collaborator.
///
/// Engine operations do not surface these to their callers directly; they are
/// folded into the structured outcome of the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("INTERVAL/{0}")]
    InvalidInterval(String),

    #[error("NOT_FOUND/{kind} {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("STORE/{0}")]
    Store(String),

    #[error("CONFIG/{0}")]
    Config(String),
}

impl EngineError {
    /// Missing entity of `kind` with `id`
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
