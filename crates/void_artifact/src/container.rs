//! Mesh containers
//!
//! A container is a persistent asset that owns artifact meshes as
//! sub-assets. It outlives every import of the model it mirrors.

use serde::{Deserialize, Serialize};

use crate::id::SubAssetId;
use crate::mesh::Mesh;

/// A mesh stored inside a container
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAsset {
    pub id: SubAssetId,
    pub mesh: Mesh,
}

impl SubAsset {
    pub fn name(&self) -> &str {
        &self.mesh.name
    }
}

/// Persistent owner of artifact meshes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshContainer {
    pub sub_assets: Vec<SubAsset>,
}

impl MeshContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SubAssetId) -> Option<&SubAsset> {
        self.sub_assets.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SubAssetId) -> Option<&mut SubAsset> {
        self.sub_assets.iter_mut().find(|s| s.id == id)
    }

    /// First sub-asset with the given mesh name
    pub fn find_by_name(&self, name: &str) -> Option<&SubAsset> {
        self.sub_assets.iter().find(|s| s.mesh.name == name)
    }

    /// Remove a sub-asset, returning it
    pub fn remove(&mut self, id: SubAssetId) -> Option<SubAsset> {
        let idx = self.sub_assets.iter().position(|s| s.id == id)?;
        Some(self.sub_assets.remove(idx))
    }

    /// Mesh names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sub_assets.iter().map(|s| s.mesh.name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sub_assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_assets.is_empty()
    }
}
