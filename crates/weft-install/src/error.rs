use std::path::PathBuf;

use thiserror::Error;
use weft_core::WeaveError;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Weave(#[from] WeaveError),

    #[error("no .weft/ workspace found at {}. Run `weft init` first.", .0.display())]
    NotInitialized(PathBuf),

    #[error("workspace is locked by another process ({})", .0.display())]
    Locked(PathBuf),

    #[error("module directory {} does not exist", .0.display())]
    ModuleNotFound(PathBuf),

    #[error("module {0} is not installed")]
    NotInstalled(String),

    #[error("step {0} doesn't exist")]
    UnknownStep(String),

    #[error("progress output: {0}")]
    Progress(#[source] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
