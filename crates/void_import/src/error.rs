//! Error types for the import pipeline

use thiserror::Error;
use void_artifact::{AssetPath, StoreError};

use crate::runtime::RuntimeError;
use crate::sync::SyncError;

/// Broad failure class, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Persistent store rejected an operation
    StorageFailure,
    /// Container holds artifacts that resolve to the same name
    MatchAmbiguity,
    /// A build step ran without the asset it depends on
    MissingDependency,
    /// Source asset or its graph is unusable as given
    InvalidSource,
    /// Scratch scene manipulation failed
    Runtime,
}

/// Failure of one asset's run
///
/// Every variant aborts the run before the source asset is deleted, so the
/// asset is picked up again on its next import.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// Nothing to import at the notified path
    #[error("source asset not found: {0}")]
    SourceMissing(AssetPath),

    /// Path too shallow to derive prefab locations from
    #[error("invalid source path {path}: {reason}")]
    InvalidSourcePath { path: AssetPath, reason: &'static str },

    /// Mechanic prefab requested without a usable visual prefab
    #[error("mechanic prefab {target} requires a visual prefab")]
    MissingDependency {
        target: AssetPath,
        visual: Option<AssetPath>,
    },

    /// A node still references a transient source mesh
    #[error("model '{model}' still binds a transient source mesh")]
    UnboundSourceMesh { model: String },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(_) | Self::Sync(SyncError::Store(_)) | Self::Runtime(RuntimeError::Store(_)) => {
                ErrorCategory::StorageFailure
            }
            Self::SourceMissing(_) => ErrorCategory::StorageFailure,
            Self::Sync(SyncError::MatchAmbiguity { .. }) => ErrorCategory::MatchAmbiguity,
            Self::MissingDependency { .. } => ErrorCategory::MissingDependency,
            Self::InvalidSourcePath { .. } | Self::UnboundSourceMesh { .. } => ErrorCategory::InvalidSource,
            Self::Sync(SyncError::DanglingBinding { .. }) => ErrorCategory::InvalidSource,
            Self::Runtime(_) => ErrorCategory::Runtime,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ImportError>;
