use thiserror::Error;

/// Errors emitted while rendering a model.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("model error: {0}")]
    Model(#[from] schemagate_core::Error),
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("{scope}: '{first}' and '{second}' both map to identifier {ident}")]
    IdentifierCollision {
        scope: String,
        first: String,
        second: String,
        ident: String,
    },
}

/// Result type for emit operations.
pub type Result<T> = std::result::Result<T, EmitError>;
