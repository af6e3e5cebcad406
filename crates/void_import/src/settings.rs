//! Model import settings
//!
//! Applied to every matching model before the host imports it. The pipeline
//! only needs geometry, so everything else is switched off or redirected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialImportMode {
    None,
    ImportStandard,
    ImportViaMaterialDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialLocation {
    /// Materials extracted to standalone assets
    External,
    /// Materials embedded in the imported model
    InPrefab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialNaming {
    ByBaseTextureName,
    BasedOnMaterialName,
    BasedOnModelNameAndMaterialName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSearch {
    Local,
    RecursiveUp,
    Everywhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TangentMode {
    Import,
    CalculateLegacy,
    CalculateLegacyWithSplitTangents,
    /// MikkTSpace
    CalculateMikk,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    None,
    Legacy,
    Generic,
    Human,
}

/// Per-model importer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelImportSettings {
    pub import_blend_shapes: bool,
    pub import_cameras: bool,
    pub import_visibility: bool,
    pub import_lights: bool,
    pub material_import_mode: MaterialImportMode,
    pub material_location: MaterialLocation,
    pub material_naming: MaterialNaming,
    pub material_search: MaterialSearch,
    pub tangents: TangentMode,
    /// Keep mesh data CPU-readable at runtime
    pub is_readable: bool,
    pub animation_type: AnimationType,
    pub import_animation: bool,
}

impl ModelImportSettings {
    /// Host importer defaults, before the pipeline touches them
    pub fn host_defaults() -> Self {
        Self {
            import_blend_shapes: true,
            import_cameras: true,
            import_visibility: true,
            import_lights: true,
            material_import_mode: MaterialImportMode::ImportViaMaterialDescription,
            material_location: MaterialLocation::InPrefab,
            material_naming: MaterialNaming::ByBaseTextureName,
            material_search: MaterialSearch::RecursiveUp,
            tangents: TangentMode::CalculateMikk,
            is_readable: true,
            animation_type: AnimationType::Generic,
            import_animation: true,
        }
    }

    /// The fixed configuration the pipeline imports with
    pub fn pipeline() -> Self {
        let mut settings = Self::host_defaults();
        settings.configure();
        settings
    }

    /// Apply the pipeline configuration in place
    pub fn configure(&mut self) {
        self.import_blend_shapes = false;
        self.import_cameras = false;
        self.import_visibility = false;
        self.import_lights = false;

        self.material_import_mode = MaterialImportMode::ImportStandard;
        self.material_location = MaterialLocation::External;
        self.material_naming = MaterialNaming::BasedOnMaterialName;
        self.material_search = MaterialSearch::Everywhere;

        self.tangents = TangentMode::CalculateMikk;
        self.is_readable = false;
        self.animation_type = AnimationType::None;
        self.import_animation = false;
    }
}

impl Default for ModelImportSettings {
    fn default() -> Self {
        Self::pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_disables_unwanted_features() {
        let mut settings = ModelImportSettings::host_defaults();
        settings.configure();

        assert!(!settings.import_blend_shapes);
        assert!(!settings.import_cameras);
        assert!(!settings.import_visibility);
        assert!(!settings.import_lights);
        assert!(!settings.is_readable);
        assert!(!settings.import_animation);
        assert_eq!(settings.animation_type, AnimationType::None);
        assert_eq!(settings.material_location, MaterialLocation::External);
        assert_eq!(settings.material_naming, MaterialNaming::BasedOnMaterialName);
        assert_eq!(settings.material_search, MaterialSearch::Everywhere);
        assert_eq!(settings.tangents, TangentMode::CalculateMikk);
        assert_eq!(settings, ModelImportSettings::pipeline());
    }
}
