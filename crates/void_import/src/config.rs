//! Pipeline configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. File named by the `VOID_IMPORT_CONFIG` environment variable
//! 2. `void_import.toml` in the working directory
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! extensions = ["fbx"]
//! container_extension = "asset"
//! prefabs_dir = "Prefabs"
//! visual_prefabs_dir = "VisualPrefabs"
//!
//! [import]
//! import_lights = false
//! tangents = "calculate_mikk"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::ModelImportSettings;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Import pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source extensions the pipeline reacts to (case-insensitive, no dot)
    pub extensions: Vec<String>,
    /// Extension of mesh containers written next to the source
    pub container_extension: String,
    /// Prefab directory under the asset root
    pub prefabs_dir: String,
    /// Visual prefab directory under `prefabs_dir`
    pub visual_prefabs_dir: String,
    pub prefab_extension: String,
    /// File name suffix of visual prefab assets
    pub visual_prefab_suffix: String,
    /// Settings applied by the pre-import hook
    pub import: ModelImportSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["fbx".to_string()],
            container_extension: "asset".to_string(),
            prefabs_dir: "Prefabs".to_string(),
            visual_prefabs_dir: "VisualPrefabs".to_string(),
            prefab_extension: "prefab".to_string(),
            visual_prefab_suffix: "_!VisualPrefab".to_string(),
            import: ModelImportSettings::pipeline(),
        }
    }
}

impl PipelineConfig {
    /// Environment variable naming a config file
    pub const ENV_VAR: &'static str = "VOID_IMPORT_CONFIG";

    /// Config file looked up in the working directory
    pub const DEFAULT_FILE: &'static str = "void_import.toml";

    /// Load configuration from all sources, falling back to defaults
    pub fn load() -> Self {
        let candidates = std::env::var(Self::ENV_VAR)
            .ok()
            .map(PathBuf::from)
            .into_iter()
            .chain(std::iter::once(PathBuf::from(Self::DEFAULT_FILE)));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded import config from {:?}", path);
                    return config;
                }
                Err(e) => log::warn!("Ignoring import config {:?}: {}", path, e),
            }
        }

        log::info!("Using default import config");
        Self::default()
    }

    /// Load and validate a TOML config file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations that would break path derivation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extension allow-list is empty".into()));
        }

        for (field, value) in [
            ("container_extension", &self.container_extension),
            ("prefabs_dir", &self.prefabs_dir),
            ("visual_prefabs_dir", &self.visual_prefabs_dir),
            ("prefab_extension", &self.prefab_extension),
        ] {
            if value.is_empty() || value.contains('/') || value.contains('\\') {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a single non-empty path segment, got {:?}",
                    field, value
                )));
            }
        }

        // A container or prefab matching the allow-list would be re-imported
        // and deleted by the next batch
        for derived in [&self.container_extension, &self.prefab_extension] {
            if self.extensions.iter().any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(derived)) {
                return Err(ConfigError::Invalid(format!(
                    "derived extension {:?} is also an import extension",
                    derived
                )));
            }
        }

        Ok(())
    }
}
