//! Scene graph data: source models, node trees and prefab assets

use serde::{Deserialize, Serialize};

use crate::id::SubAssetId;
use crate::mesh::Mesh;
use crate::path::AssetPath;

/// Reference to a mesh artifact owned by a container
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Container asset holding the artifact
    pub container: AssetPath,
    /// Sub-asset identity inside the container
    pub id: SubAssetId,
}

/// What a node renders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshBinding {
    /// Transient mesh owned by the source model (index into `SourceModel::meshes`)
    Source(usize),
    /// Persistent mesh artifact
    Artifact(ArtifactRef),
}

/// Local transform
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation quaternion (x, y, z, w)
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: identity_rotation(),
            scale: unit_scale(),
        }
    }
}

/// A node in a scene or prefab hierarchy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// Static nodes are eligible for batching downstream
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub mesh: Option<MeshBinding>,
    /// Prefab this node is a live instance of; `None` once unpacked
    #[serde(default)]
    pub prefab_link: Option<AssetPath>,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            transform: Transform::default(),
            mesh: None,
            prefab_link: None,
            children: Vec::new(),
        }
    }

    /// Builder-style mesh binding
    pub fn with_mesh(mut self, binding: MeshBinding) -> Self {
        self.mesh = Some(binding);
        self
    }

    /// Builder-style child
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Visit every node depth-first, parents before children
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Mutable depth-first visit
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn set_static_recursive(&mut self, is_static: bool) {
        self.visit_mut(&mut |node| node.is_static = is_static);
    }

    /// Drop every prefab link in the hierarchy
    pub fn unpack_completely(&mut self) {
        self.visit_mut(&mut |node| node.prefab_link = None);
    }

    /// Direct child by name
    pub fn find_child(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All mesh bindings in the hierarchy
    pub fn bindings(&self) -> Vec<&MeshBinding> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Some(binding) = &node.mesh {
                out.push(binding);
            }
        });
        out
    }

    /// True if any node still points at a transient source mesh
    pub fn has_source_bindings(&self) -> bool {
        self.bindings()
            .iter()
            .any(|b| matches!(b, MeshBinding::Source(_)))
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }
}

/// An imported model resident in memory
///
/// Ephemeral: it lives for one import run and its asset is deleted at the end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceModel {
    /// Model name (the source file stem)
    pub name: String,
    pub root: SceneNode,
    /// Meshes owned by this model; bound by index from nodes
    pub meshes: Vec<Mesh>,
}

impl SourceModel {
    pub fn new(name: impl Into<String>, root: SceneNode, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            root,
            meshes,
        }
    }

    /// Point every node bound to source mesh `index` at `artifact`
    pub fn rebind(&mut self, index: usize, artifact: &ArtifactRef) -> usize {
        let mut rebound = 0;
        self.root.visit_mut(&mut |node| {
            if node.mesh == Some(MeshBinding::Source(index)) {
                node.mesh = Some(MeshBinding::Artifact(artifact.clone()));
                rebound += 1;
            }
        });
        rebound
    }

    /// Indices of source meshes actually referenced by a node
    pub fn bound_mesh_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .root
            .bindings()
            .into_iter()
            .filter_map(|b| match b {
                MeshBinding::Source(i) => Some(*i),
                MeshBinding::Artifact(_) => None,
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn has_source_bindings(&self) -> bool {
        self.root.has_source_bindings()
    }
}

/// A saved prefab
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefabAsset {
    pub root: SceneNode,
}

impl PrefabAsset {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }

    /// Name of the root node
    pub fn name(&self) -> &str {
        &self.root.name
    }

    /// Pretty JSON dump for diagnostics
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Handle to a prefab saved in the store
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrefabHandle {
    pub path: AssetPath,
    /// Root node name at save time
    pub name: String,
}
