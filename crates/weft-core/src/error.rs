use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeaveError>;

/// Failures raised while reading or rewriting class sources.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// The class id could not be resolved to a source.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// The class declares no method of that name.
    #[error("method {class}::{method} not found")]
    MethodNotFound { class: String, method: String },

    /// The declaration cannot be split into signature and statements.
    #[error("malformed body in {class}::{method}: {reason}")]
    MalformedBody {
        class: String,
        method: String,
        reason: &'static str,
    },

    /// The class text itself has no usable class body.
    #[error("malformed class {class}: {reason}")]
    MalformedClass { class: String, reason: &'static str },

    #[error("invalid module name {name:?}: {reason}")]
    InvalidModuleName { name: String, reason: &'static str },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WeaveError {
    /// Whether the error aborts the enclosing bind/unbind call.
    ///
    /// `MethodNotFound` and `MalformedBody` only affect one hook; everything
    /// else is structural.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            WeaveError::MethodNotFound { .. } | WeaveError::MalformedBody { .. }
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WeaveError::Io {
            path: path.into(),
            source,
        }
    }
}
