//! Asset store seam
//!
//! The pipeline never touches storage directly; everything persistent goes
//! through [`AssetStore`]. Each call is treated as atomic on its own, nothing
//! is assumed about atomicity across calls.

use core::fmt;
use thiserror::Error;

use crate::container::SubAsset;
use crate::id::SubAssetId;
use crate::mesh::{Mesh, NormalCountMismatch};
use crate::path::AssetPath;
use crate::scene::{PrefabAsset, SourceModel};

/// Kind of object stored at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Container,
    Prefab,
    Directory,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Container => write!(f, "container"),
            Self::Prefab => write!(f, "prefab"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Store operation, used in error reports and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadModel,
    CreateContainer,
    AttachSubAsset,
    LoadSubAssets,
    CopySerialized,
    SetNormals,
    DestroySubAsset,
    CreateDirectory,
    WritePrefab,
    LoadPrefab,
    Save,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadModel => "load_model",
            Self::CreateContainer => "create_container",
            Self::AttachSubAsset => "attach_sub_asset",
            Self::LoadSubAssets => "load_all_sub_assets",
            Self::CopySerialized => "copy_serialized",
            Self::SetNormals => "set_normals",
            Self::DestroySubAsset => "destroy_sub_asset",
            Self::CreateDirectory => "create_directory_all",
            Self::WritePrefab => "write_prefab",
            Self::LoadPrefab => "load_prefab",
            Self::Save => "save",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Asset store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Nothing stored at the path
    #[error("asset not found: {0}")]
    NotFound(AssetPath),

    /// Create target already occupied
    #[error("asset already exists: {0}")]
    AlreadyExists(AssetPath),

    /// Path holds a different kind of object
    #[error("asset at {path} is a {found}, expected a {expected}")]
    WrongKind {
        path: AssetPath,
        expected: AssetKind,
        found: AssetKind,
    },

    /// Sub-asset id unknown to the container
    #[error("sub-asset {id} not found in {container}")]
    SubAssetNotFound { container: AssetPath, id: SubAssetId },

    #[error(transparent)]
    NormalCountMismatch(#[from] NormalCountMismatch),

    /// Backend refused the operation (I/O, permissions, invalid path)
    #[error("store rejected {op} on {path}: {reason}")]
    Rejected {
        op: StoreOp,
        path: AssetPath,
        reason: String,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent object store
pub trait AssetStore {
    /// Whether anything (asset or directory) exists at `path`
    fn path_exists(&self, path: &AssetPath) -> bool;

    /// Load an imported source model, `None` if nothing is stored there
    fn load_model(&self, path: &AssetPath) -> StoreResult<Option<SourceModel>>;

    /// Create an empty container asset
    fn create_container(&mut self, path: &AssetPath) -> StoreResult<()>;

    /// Attach a mesh as a new sub-asset of a container
    fn attach_sub_asset(&mut self, container: &AssetPath, mesh: Mesh) -> StoreResult<SubAssetId>;

    /// Every sub-asset of a container, in storage order
    fn load_all_sub_assets(&self, container: &AssetPath) -> StoreResult<Vec<SubAsset>>;

    /// Generic structural copy of `source` onto an existing sub-asset
    ///
    /// Backends may post-process the copy (e.g. re-derive normals); callers
    /// that need exact normals restore them with [`AssetStore::set_normals`].
    fn copy_serialized(&mut self, container: &AssetPath, id: SubAssetId, source: &Mesh) -> StoreResult<()>;

    /// Overwrite the normals of a sub-asset verbatim
    fn set_normals(&mut self, container: &AssetPath, id: SubAssetId, normals: &[[f32; 3]]) -> StoreResult<()>;

    /// Permanently destroy a sub-asset
    fn destroy_sub_asset(&mut self, container: &AssetPath, id: SubAssetId) -> StoreResult<()>;

    /// Create a directory and any missing parents
    fn create_directory_all(&mut self, dir: &AssetPath) -> StoreResult<()>;

    /// Write a prefab, replacing any prefab already at `path`
    fn write_prefab(&mut self, path: &AssetPath, prefab: PrefabAsset) -> StoreResult<()>;

    /// Load a prefab, `None` if nothing is stored there
    fn load_prefab(&self, path: &AssetPath) -> StoreResult<Option<PrefabAsset>>;

    /// Flush pending changes
    fn save(&mut self) -> StoreResult<()>;

    /// Delete the asset at `path`
    fn delete(&mut self, path: &AssetPath) -> StoreResult<()>;
}
