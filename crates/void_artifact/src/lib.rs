//! # void_artifact - Persistent Mesh Artifacts
//!
//! Data model and storage seam for the model import pipeline:
//! - Store-relative asset paths
//! - Meshes with explicit normal capture/restore
//! - Source models, scene nodes and prefab assets
//! - Mesh containers owning artifact sub-assets
//! - The [`AssetStore`] trait and an in-memory [`MemoryStore`]
//!
//! ## Example
//!
//! ```ignore
//! use void_artifact::prelude::*;
//!
//! let mut store = MemoryStore::new();
//! store.insert_model("Assets/Models/Robot/Robot.fbx", model);
//!
//! let container = AssetPath::new("Assets/Models/Robot/Robot.asset");
//! store.create_container(&container)?;
//! let id = store.attach_sub_asset(&container, mesh)?;
//! store.save()?;
//! ```

pub mod container;
pub mod id;
pub mod memory;
pub mod mesh;
pub mod path;
pub mod scene;
pub mod store;

pub use container::{MeshContainer, SubAsset};
pub use id::{InstanceId, SubAssetId};
pub use memory::MemoryStore;
pub use mesh::{Bounds, Mesh, NormalCountMismatch, PrimitiveTopology, SubMesh, Vertex};
pub use path::AssetPath;
pub use scene::{ArtifactRef, MeshBinding, PrefabAsset, PrefabHandle, SceneNode, SourceModel, Transform};
pub use store::{AssetKind, AssetStore, StoreError, StoreOp, StoreResult};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::container::{MeshContainer, SubAsset};
    pub use crate::memory::MemoryStore;
    pub use crate::mesh::{Mesh, Vertex};
    pub use crate::path::AssetPath;
    pub use crate::scene::{ArtifactRef, MeshBinding, PrefabAsset, PrefabHandle, SceneNode, SourceModel};
    pub use crate::store::{AssetStore, StoreError, StoreResult};
}
