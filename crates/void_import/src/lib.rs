//! # void_import - Model Import Pipeline
//!
//! Turns freshly imported models into persistent assets:
//! - Mesh artifacts mirrored into a container next to each model
//! - A static visual prefab bound to those artifacts
//! - A mechanic prefab wrapping the visual prefab, created once
//!
//! The source model is deleted only after every step succeeded, so a failed
//! run is retried on the next import.
//!
//! ## Example
//!
//! ```ignore
//! use void_import::prelude::*;
//!
//! let store = MemoryStore::new();
//! let mut pipeline = ImportPipeline::new(store, SceneWorld::new(), PipelineConfig::load());
//!
//! let report = pipeline.on_imports_completed(&[AssetPath::new("Assets/Models/Robot/Robot.fbx")]);
//! for (path, error) in &report.failed {
//!     log::warn!("{}: {}", path, error);
//! }
//! ```

pub mod config;
pub mod error;
pub mod mechanic;
pub mod naming;
pub mod pipeline;
pub mod runtime;
pub mod settings;
pub mod sync;
pub mod visual;

#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use config::{ConfigError, PipelineConfig};
pub use error::{ErrorCategory, ImportError, Result};
pub use mechanic::{build_mechanic_prefab, MechanicOutcome};
pub use naming::TargetPaths;
pub use pipeline::{BatchReport, ImportOutcome, ImportPipeline};
pub use runtime::{RuntimeError, RuntimeResult, SceneRuntime, SceneWorld};
pub use settings::ModelImportSettings;
pub use sync::{synchronize, SyncError, SyncPlan, SyncReport};
pub use visual::build_visual_prefab;

#[cfg(feature = "file-watcher")]
pub use watcher::{to_asset_path, ImportWatcher, WatchError};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::error::{ImportError, Result};
    pub use crate::mechanic::MechanicOutcome;
    pub use crate::pipeline::{BatchReport, ImportOutcome, ImportPipeline};
    pub use crate::runtime::{SceneRuntime, SceneWorld};
    pub use crate::settings::ModelImportSettings;
    pub use void_artifact::prelude::*;
}
