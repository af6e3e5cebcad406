//! Naming convention and target paths
//!
//! The suffixes here are part of the on-disk contract with containers and
//! prefabs written by earlier runs; they must stay byte-for-byte identical.

use void_artifact::AssetPath;

use crate::config::PipelineConfig;
use crate::error::ImportError;

/// Suffix carried by every mesh artifact
pub const ARTIFACT_SUFFIX: &str = "_!Artifact";

/// Suffix carried by the root node of a visual prefab
pub const VISUAL_SUFFIX: &str = "_!Visual";

/// Fixed name of the mechanic prefab child holding the visual instance
pub const VISUAL_CHILD_NAME: &str = "Visual";

/// Artifact name for a source mesh
pub fn artifact_name(base_name: &str) -> String {
    format!("{}{}", base_name, ARTIFACT_SUFFIX)
}

/// Source mesh name an artifact was derived from
pub fn source_name_of(artifact_name: &str) -> Option<&str> {
    artifact_name.strip_suffix(ARTIFACT_SUFFIX)
}

/// Root name of a visual prefab
pub fn visual_name(base_name: &str) -> String {
    format!("{}{}", base_name, VISUAL_SUFFIX)
}

/// Mechanic root name for a visual prefab name
pub fn strip_visual_suffix(name: &str) -> &str {
    name.strip_suffix(VISUAL_SUFFIX).unwrap_or(name)
}

/// Container path next to the source asset
pub fn container_path(source: &AssetPath, container_extension: &str) -> AssetPath {
    source.with_extension(container_extension)
}

/// Every location a source asset's run writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    /// Model base name (source file stem)
    pub base_name: String,
    pub container: AssetPath,
    pub visual_dir: AssetPath,
    pub visual_prefab: AssetPath,
    pub mechanic_prefab: AssetPath,
}

impl TargetPaths {
    /// Derive targets from `<root>/<model dir>/<name>.<ext>`
    ///
    /// Visual prefabs go to `<root>/Prefabs/VisualPrefabs/<name>_!VisualPrefab.prefab`
    /// and mechanic prefabs to `<root>/Prefabs/<name>.prefab` (directory names,
    /// file suffix and extension come from the config).
    pub fn for_source(source: &AssetPath, config: &PipelineConfig) -> Result<Self, ImportError> {
        let invalid = |reason: &'static str| ImportError::InvalidSourcePath {
            path: source.clone(),
            reason,
        };

        let base_name = source.file_stem();
        if base_name.is_empty() {
            return Err(invalid("empty file name"));
        }
        let model_dir = source.parent().ok_or_else(|| invalid("no model directory"))?;
        let root = model_dir.parent().ok_or_else(|| invalid("model directory has no parent"))?;

        let prefabs_dir = root.join(&config.prefabs_dir);
        let visual_dir = prefabs_dir.join(&config.visual_prefabs_dir);
        let visual_prefab = visual_dir.join(&format!(
            "{}{}.{}",
            base_name, config.visual_prefab_suffix, config.prefab_extension
        ));
        let mechanic_prefab = prefabs_dir.join(&format!("{}.{}", base_name, config.prefab_extension));

        Ok(Self {
            base_name: base_name.to_string(),
            container: container_path(source, &config.container_extension),
            visual_dir,
            visual_prefab,
            mechanic_prefab,
        })
    }
}
