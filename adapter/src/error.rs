//! Error types for the UCI adapter

use std::path::PathBuf;

use thiserror::Error;

use crate::uci::options::UciOption;

pub type SessionResult<T> = Result<T, SessionError>;

/// Rejection of a `setoption` request before anything reaches the engine.
#[derive(Error, Debug)]
pub enum OptionError {
    #[error("Unknown UCI option: {0}")]
    UnknownOption(String),

    #[error("{option} expects {expected}, got {value:?}")]
    TypeMismatch {
        option: UciOption,
        expected: &'static str,
        value: String,
    },

    #[error("{option} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        option: UciOption,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{option}: file not found: {}", path.display())]
    FileNotFound { option: UciOption, path: PathBuf },

    #[error("{option}: directory not found: {}", path.display())]
    DirectoryNotFound { option: UciOption, path: PathBuf },
}

impl OptionError {
    /// Content problem: wrong type, out of range, or an unknown name.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OptionError::UnknownOption(_)
                | OptionError::TypeMismatch { .. }
                | OptionError::OutOfRange { .. }
        )
    }

    /// Filesystem problem: a referenced file or directory is missing.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(
            self,
            OptionError::FileNotFound { .. } | OptionError::DirectoryNotFound { .. }
        )
    }
}

/// Failures talking to the engine collaborator.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn engine at {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine has no stdin")]
    NoStdin,

    #[error("Engine has no stdout")]
    NoStdout,

    #[error("Engine was not started")]
    NotStarted,

    #[error("Engine channel closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid option: {0}")]
    Option(#[from] OptionError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
