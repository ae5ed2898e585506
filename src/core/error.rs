//! Defines the error types of the archive engine.

use std::path::PathBuf;
use thiserror::Error;

/// The error type a host file service reports.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host process cannot be reached at all.
    #[error("Host service is unavailable")]
    Unavailable,

    /// The host refused or failed the request.
    #[error("{0}")]
    Rejected(String),

    /// An I/O error surfaced by the host.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The primary error type returned by engine operations.
///
/// Every variant that reaches a caller carries enough context (operation
/// name, affected path) for UI-level guidance text; `user_message` renders
/// the single human-readable message.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The file service boundary is not reachable.
    #[error("The file service is not available ({operation})")]
    ServiceUnavailable { operation: &'static str },

    /// The host reported failure for a create/rename/move/delete request.
    #[error("{operation} failed for {path}: {message}")]
    MutationRejected {
        operation: &'static str,
        path: PathBuf,
        message: String,
    },

    /// A deep-link lookup found nothing.
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    /// A second mutation was issued for a path that is still being mutated.
    #[error("Another operation is still running on {0}")]
    MutationInProgress(PathBuf),

    /// The operation requires an open case.
    #[error("No case is open ({operation})")]
    NoCaseSelected { operation: &'static str },

    /// Thumbnail generation failed. Absorbed by the thumbnail cache.
    #[error("Thumbnail generation failed for {path}: {message}")]
    Generation { path: PathBuf, message: String },
}

impl EngineError {
    /// Maps a host failure for `operation` on `path` into the engine taxonomy.
    pub fn from_host(operation: &'static str, path: impl Into<PathBuf>, err: HostError) -> Self {
        match err {
            HostError::Unavailable => EngineError::ServiceUnavailable { operation },
            other => EngineError::MutationRejected {
                operation,
                path: path.into(),
                message: other.to_string(),
            },
        }
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::ServiceUnavailable { .. } => {
                "The file service is not available. Please restart the application.".to_string()
            }
            EngineError::MutationRejected {
                operation,
                path,
                message,
            } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("Could not {} \"{}\": {}", operation, name, message)
            }
            EngineError::NotFound(_) => {
                "Document not found. It may have been moved or deleted.".to_string()
            }
            EngineError::MutationInProgress(_) => {
                "Please wait for the previous operation on this item to finish.".to_string()
            }
            EngineError::NoCaseSelected { .. } => "Please open a case first.".to_string(),
            EngineError::Generation { .. } => "Preview unavailable.".to_string(),
        }
    }

    /// The operation that failed, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            EngineError::ServiceUnavailable { operation }
            | EngineError::MutationRejected { operation, .. }
            | EngineError::NoCaseSelected { operation } => Some(operation),
            EngineError::NotFound(_) => Some("find document"),
            EngineError::MutationInProgress(_) | EngineError::Generation { .. } => None,
        }
    }

    /// The affected path, when there is one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            EngineError::MutationRejected { path, .. }
            | EngineError::Generation { path, .. }
            | EngineError::NotFound(path)
            | EngineError::MutationInProgress(path) => Some(path),
            EngineError::ServiceUnavailable { .. } | EngineError::NoCaseSelected { .. } => None,
        }
    }
}
