//! In-memory asset store
//!
//! Shares its state between clones so a host can keep observing the store
//! after handing one clone to a pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use parking_lot::RwLock;

use crate::container::{MeshContainer, SubAsset};
use crate::id::SubAssetId;
use crate::mesh::Mesh;
use crate::path::AssetPath;
use crate::scene::{PrefabAsset, SourceModel};
use crate::store::{AssetKind, AssetStore, StoreError, StoreOp, StoreResult};

/// Stored object
#[derive(Clone, Debug)]
enum Entry {
    Model(SourceModel),
    Container(MeshContainer),
    Prefab(PrefabAsset),
}

impl Entry {
    fn kind(&self) -> AssetKind {
        match self {
            Entry::Model(_) => AssetKind::Model,
            Entry::Container(_) => AssetKind::Container,
            Entry::Prefab(_) => AssetKind::Prefab,
        }
    }
}

/// Injected failure
#[derive(Clone, Debug)]
struct FailPoint {
    op: StoreOp,
    /// `None` matches every path
    path: Option<AssetPath>,
}

struct Inner {
    entries: BTreeMap<AssetPath, Entry>,
    directories: BTreeSet<AssetPath>,
    next_id: u64,
    dirty: bool,
    flushes: u64,
    recalculate_normals_on_copy: bool,
    fail_points: Vec<FailPoint>,
}

impl Inner {
    fn check(&self, op: StoreOp, path: &AssetPath) -> StoreResult<()> {
        let hit = self
            .fail_points
            .iter()
            .any(|fp| fp.op == op && fp.path.as_ref().map_or(true, |p| p == path));
        if hit {
            return Err(StoreError::Rejected {
                op,
                path: path.clone(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> SubAssetId {
        let id = SubAssetId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn add_directory_chain(&mut self, dir: &AssetPath) {
        let mut current = Some(dir.clone());
        while let Some(path) = current {
            if path.as_str().is_empty() || !self.directories.insert(path.clone()) {
                break;
            }
            current = path.parent();
        }
    }

    fn require_parent_dir(&self, op: StoreOp, path: &AssetPath) -> StoreResult<()> {
        match path.parent() {
            Some(parent) if !self.directories.contains(&parent) => Err(StoreError::Rejected {
                op,
                path: path.clone(),
                reason: format!("directory {} does not exist", parent),
            }),
            _ => Ok(()),
        }
    }

    fn container(&self, path: &AssetPath) -> StoreResult<&MeshContainer> {
        match self.entries.get(path) {
            Some(Entry::Container(c)) => Ok(c),
            Some(other) => Err(StoreError::WrongKind {
                path: path.clone(),
                expected: AssetKind::Container,
                found: other.kind(),
            }),
            None => Err(StoreError::NotFound(path.clone())),
        }
    }

    fn container_mut(&mut self, path: &AssetPath) -> StoreResult<&mut MeshContainer> {
        match self.entries.get_mut(path) {
            Some(Entry::Container(c)) => Ok(c),
            Some(other) => Err(StoreError::WrongKind {
                path: path.clone(),
                expected: AssetKind::Container,
                found: other.kind(),
            }),
            None => Err(StoreError::NotFound(path.clone())),
        }
    }

    fn sub_asset_mut(&mut self, container: &AssetPath, id: SubAssetId) -> StoreResult<&mut SubAsset> {
        self.container_mut(container)?
            .get_mut(id)
            .ok_or_else(|| StoreError::SubAssetNotFound {
                container: container.clone(),
                id,
            })
    }
}

/// Asset store kept entirely in memory
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: BTreeMap::new(),
                directories: BTreeSet::new(),
                next_id: 1,
                dirty: false,
                flushes: 0,
                recalculate_normals_on_copy: false,
                fail_points: Vec::new(),
            })),
        }
    }

    /// Make `copy_serialized` re-derive normals after copying, the way some
    /// host copy primitives do
    pub fn with_normal_recalculation(self, enabled: bool) -> Self {
        self.inner.write().recalculate_normals_on_copy = enabled;
        self
    }

    /// Place an imported model at `path`, creating its directories
    pub fn insert_model(&self, path: impl Into<AssetPath>, model: SourceModel) {
        let path = path.into();
        let mut inner = self.inner.write();
        if let Some(parent) = path.parent() {
            inner.add_directory_chain(&parent);
        }
        inner.entries.insert(path, Entry::Model(model));
    }

    /// Fail every future `op` on `path`
    pub fn fail_on(&self, op: StoreOp, path: impl Into<AssetPath>) {
        self.inner.write().fail_points.push(FailPoint {
            op,
            path: Some(path.into()),
        });
    }

    /// Fail every future `op` regardless of path
    pub fn fail_on_any(&self, op: StoreOp) {
        self.inner.write().fail_points.push(FailPoint { op, path: None });
    }

    pub fn clear_failures(&self) {
        self.inner.write().fail_points.clear();
    }

    /// Snapshot of a stored model
    pub fn model(&self, path: &AssetPath) -> Option<SourceModel> {
        match self.inner.read().entries.get(path) {
            Some(Entry::Model(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// Snapshot of a stored container
    pub fn container(&self, path: &AssetPath) -> Option<MeshContainer> {
        match self.inner.read().entries.get(path) {
            Some(Entry::Container(c)) => Some(c.clone()),
            _ => None,
        }
    }

    /// Snapshot of a stored prefab
    pub fn prefab(&self, path: &AssetPath) -> Option<PrefabAsset> {
        match self.inner.read().entries.get(path) {
            Some(Entry::Prefab(p)) => Some(p.clone()),
            _ => None,
        }
    }

    /// Kind of the object at `path`
    pub fn kind_of(&self, path: &AssetPath) -> Option<AssetKind> {
        let inner = self.inner.read();
        if let Some(entry) = inner.entries.get(path) {
            return Some(entry.kind());
        }
        inner.directories.contains(path).then_some(AssetKind::Directory)
    }

    /// All asset paths (directories excluded), sorted
    pub fn asset_paths(&self) -> Vec<AssetPath> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Number of completed `save` calls
    pub fn flush_count(&self) -> u64 {
        self.inner.read().flushes
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.read().dirty
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MemoryStore")
            .field("assets", &inner.entries.len())
            .field("directories", &inner.directories.len())
            .field("dirty", &inner.dirty)
            .finish()
    }
}

impl AssetStore for MemoryStore {
    fn path_exists(&self, path: &AssetPath) -> bool {
        let inner = self.inner.read();
        inner.entries.contains_key(path) || inner.directories.contains(path)
    }

    fn load_model(&self, path: &AssetPath) -> StoreResult<Option<SourceModel>> {
        let inner = self.inner.read();
        inner.check(StoreOp::LoadModel, path)?;
        match inner.entries.get(path) {
            Some(Entry::Model(m)) => Ok(Some(m.clone())),
            Some(other) => Err(StoreError::WrongKind {
                path: path.clone(),
                expected: AssetKind::Model,
                found: other.kind(),
            }),
            None => Ok(None),
        }
    }

    fn create_container(&mut self, path: &AssetPath) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::CreateContainer, path)?;
        if inner.entries.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        inner.require_parent_dir(StoreOp::CreateContainer, path)?;
        inner.entries.insert(path.clone(), Entry::Container(MeshContainer::new()));
        inner.dirty = true;
        Ok(())
    }

    fn attach_sub_asset(&mut self, container: &AssetPath, mesh: Mesh) -> StoreResult<SubAssetId> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::AttachSubAsset, container)?;
        // Validate before allocating so a failed attach leaves no gap
        inner.container(container)?;
        let id = inner.allocate_id();
        inner.container_mut(container)?.sub_assets.push(SubAsset { id, mesh });
        inner.dirty = true;
        Ok(id)
    }

    fn load_all_sub_assets(&self, container: &AssetPath) -> StoreResult<Vec<SubAsset>> {
        let inner = self.inner.read();
        inner.check(StoreOp::LoadSubAssets, container)?;
        Ok(inner.container(container)?.sub_assets.clone())
    }

    fn copy_serialized(&mut self, container: &AssetPath, id: SubAssetId, source: &Mesh) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::CopySerialized, container)?;
        let recalculate = inner.recalculate_normals_on_copy;
        let sub = inner.sub_asset_mut(container, id)?;
        sub.mesh.copy_contents_from(source);
        if recalculate {
            sub.mesh.recalculate_normals();
        }
        inner.dirty = true;
        Ok(())
    }

    fn set_normals(&mut self, container: &AssetPath, id: SubAssetId, normals: &[[f32; 3]]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::SetNormals, container)?;
        inner.sub_asset_mut(container, id)?.mesh.set_normals(normals)?;
        inner.dirty = true;
        Ok(())
    }

    fn destroy_sub_asset(&mut self, container: &AssetPath, id: SubAssetId) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::DestroySubAsset, container)?;
        inner
            .container_mut(container)?
            .remove(id)
            .ok_or_else(|| StoreError::SubAssetNotFound {
                container: container.clone(),
                id,
            })?;
        inner.dirty = true;
        Ok(())
    }

    fn create_directory_all(&mut self, dir: &AssetPath) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::CreateDirectory, dir)?;
        if let Some(entry) = inner.entries.get(dir) {
            return Err(StoreError::WrongKind {
                path: dir.clone(),
                expected: AssetKind::Directory,
                found: entry.kind(),
            });
        }
        inner.add_directory_chain(dir);
        Ok(())
    }

    fn write_prefab(&mut self, path: &AssetPath, prefab: PrefabAsset) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::WritePrefab, path)?;
        inner.require_parent_dir(StoreOp::WritePrefab, path)?;
        match inner.entries.get(path) {
            None | Some(Entry::Prefab(_)) => {}
            Some(other) => {
                return Err(StoreError::WrongKind {
                    path: path.clone(),
                    expected: AssetKind::Prefab,
                    found: other.kind(),
                })
            }
        }
        inner.entries.insert(path.clone(), Entry::Prefab(prefab));
        inner.dirty = true;
        Ok(())
    }

    fn load_prefab(&self, path: &AssetPath) -> StoreResult<Option<PrefabAsset>> {
        let inner = self.inner.read();
        inner.check(StoreOp::LoadPrefab, path)?;
        match inner.entries.get(path) {
            Some(Entry::Prefab(p)) => Ok(Some(p.clone())),
            Some(other) => Err(StoreError::WrongKind {
                path: path.clone(),
                expected: AssetKind::Prefab,
                found: other.kind(),
            }),
            None => Ok(None),
        }
    }

    fn save(&mut self) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::Save, &AssetPath::new(""))?;
        inner.dirty = false;
        inner.flushes += 1;
        Ok(())
    }

    fn delete(&mut self, path: &AssetPath) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check(StoreOp::Delete, path)?;
        if inner.entries.remove(path).is_none() {
            return Err(StoreError::NotFound(path.clone()));
        }
        log::debug!("Deleted asset: {}", path);
        inner.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Vertex;
    use crate::scene::SceneNode;

    fn triangle(name: &str) -> Mesh {
        let n = [0.0, 0.0, 1.0];
        Mesh::new(
            name,
            vec![
                Vertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], n, [0.0, 1.0]),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_container_lifecycle() {
        let mut store = MemoryStore::new();
        let model_path = AssetPath::new("Assets/Models/Robot/Robot.fbx");
        store.insert_model(model_path.clone(), SourceModel::new("Robot", SceneNode::new("Robot"), vec![]));

        let container = model_path.with_extension("asset");
        store.create_container(&container).unwrap();
        assert_eq!(
            store.create_container(&container),
            Err(StoreError::AlreadyExists(container.clone()))
        );
        assert!(store.container(&container).unwrap().is_empty());

        let a = store.attach_sub_asset(&container, triangle("A")).unwrap();
        let b = store.attach_sub_asset(&container, triangle("B")).unwrap();
        assert_ne!(a, b);
        assert!(store.has_unsaved_changes());

        store.destroy_sub_asset(&container, a).unwrap();
        let remaining = store.load_all_sub_assets(&container).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b);
        assert_eq!(store.container(&container).unwrap().len(), 1);

        store.save().unwrap();
        assert!(!store.has_unsaved_changes());
        assert_eq!(store.flush_count(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let observer = store.clone();
        store.insert_model("a/b/m.fbx", SourceModel::new("m", SceneNode::new("m"), vec![]));
        assert!(observer.model(&AssetPath::new("a/b/m.fbx")).is_some());
        assert_eq!(observer.kind_of(&AssetPath::new("a/b")), Some(AssetKind::Directory));
        assert_eq!(observer.kind_of(&AssetPath::new("a")), Some(AssetKind::Directory));
    }

    #[test]
    fn test_copy_serialized_can_recalculate_normals() {
        let mut store = MemoryStore::new().with_normal_recalculation(true);
        store.insert_model("a/b/m.fbx", SourceModel::new("m", SceneNode::new("m"), vec![]));
        let container = AssetPath::new("a/b/m.asset");
        store.create_container(&container).unwrap();
        let id = store.attach_sub_asset(&container, triangle("T")).unwrap();

        let mut source = triangle("T");
        let tilted = [[0.0, 0.6, 0.8]; 3];
        source.set_normals(&tilted).unwrap();

        store.copy_serialized(&container, id, &source).unwrap();
        let copied = store.load_all_sub_assets(&container).unwrap().remove(0).mesh;
        assert!(!copied.normals_bit_identical(&source));

        store.set_normals(&container, id, &tilted).unwrap();
        let restored = store.load_all_sub_assets(&container).unwrap().remove(0).mesh;
        assert!(restored.normals_bit_identical(&source));
    }

    #[test]
    fn test_prefab_requires_directory() {
        let mut store = MemoryStore::new();
        let path = AssetPath::new("Assets/Prefabs/Robot.prefab");
        let prefab = PrefabAsset::new(SceneNode::new("Robot"));

        assert!(matches!(
            store.write_prefab(&path, prefab.clone()),
            Err(StoreError::Rejected { op: StoreOp::WritePrefab, .. })
        ));

        store.create_directory_all(&AssetPath::new("Assets/Prefabs")).unwrap();
        store.write_prefab(&path, prefab.clone()).unwrap();
        assert_eq!(store.load_prefab(&path).unwrap(), Some(prefab));
    }

    #[test]
    fn test_fault_injection() {
        let mut store = MemoryStore::new();
        store.insert_model("a/b/m.fbx", SourceModel::new("m", SceneNode::new("m"), vec![]));
        let path = AssetPath::new("a/b/m.fbx");

        store.fail_on(StoreOp::Delete, path.clone());
        assert!(store.delete(&path).is_err());
        assert!(store.path_exists(&path));

        store.clear_failures();
        store.delete(&path).unwrap();
        assert!(!store.path_exists(&path));
        assert_eq!(store.delete(&path), Err(StoreError::NotFound(path)));

        store.fail_on_any(StoreOp::Save);
        assert!(matches!(store.save(), Err(StoreError::Rejected { op: StoreOp::Save, .. })));
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn test_wrong_kind() {
        let mut store = MemoryStore::new();
        store.insert_model("a/b/m.fbx", SourceModel::new("m", SceneNode::new("m"), vec![]));
        let path = AssetPath::new("a/b/m.fbx");
        assert!(matches!(
            store.load_all_sub_assets(&path),
            Err(StoreError::WrongKind { expected: AssetKind::Container, found: AssetKind::Model, .. })
        ));
    }
}
