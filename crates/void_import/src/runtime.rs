//! Scene runtime seam
//!
//! Prefab assembly happens on scratch instances: instantiate, edit, save as a
//! prefab asset, destroy. [`SceneRuntime`] is that surface; [`SceneWorld`]
//! implements it in memory.

use std::collections::BTreeMap;

use thiserror::Error;
use void_artifact::{AssetPath, AssetStore, InstanceId, PrefabAsset, PrefabHandle, SceneNode, SourceModel, StoreError};

/// Scene runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("scratch instance {0} does not exist")]
    UnknownInstance(InstanceId),

    #[error("cannot parent {child} under {parent}: would create a cycle")]
    ParentCycle { child: InstanceId, parent: InstanceId },

    #[error("prefab not found: {0}")]
    PrefabNotFound(AssetPath),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Scratch scene manipulation
pub trait SceneRuntime {
    /// Instantiate an imported model as a linked instance
    fn instantiate_model(&mut self, source: &AssetPath, model: &SourceModel) -> RuntimeResult<InstanceId>;

    /// Instantiate a saved prefab as a linked instance
    fn instantiate_prefab(&mut self, store: &dyn AssetStore, prefab: &PrefabHandle) -> RuntimeResult<InstanceId>;

    /// Create an empty node
    fn create_empty(&mut self, name: &str) -> InstanceId;

    /// Attach `child` (and everything under it) below `parent`
    fn set_parent(&mut self, child: InstanceId, parent: InstanceId) -> RuntimeResult<()>;

    /// Break every prefab link inside an instance
    fn unpack_completely(&mut self, instance: InstanceId) -> RuntimeResult<()>;

    /// Root node of an instance
    fn node_mut(&mut self, instance: InstanceId) -> Option<&mut SceneNode>;

    /// Save an instance, with its attached children, as a prefab asset
    fn save_prefab(
        &mut self,
        store: &mut dyn AssetStore,
        instance: InstanceId,
        path: &AssetPath,
    ) -> RuntimeResult<PrefabHandle>;

    /// Destroy an instance and its attached children; false if unknown
    fn destroy_scratch_instance(&mut self, instance: InstanceId) -> bool;

    /// Number of scratch instances alive
    fn live_instances(&self) -> usize;
}

struct Slot {
    node: SceneNode,
    parent: Option<InstanceId>,
    /// Attached instances, in attach order
    attached: Vec<InstanceId>,
}

/// In-memory scene runtime
#[derive(Default)]
pub struct SceneWorld {
    slots: BTreeMap<InstanceId, Slot>,
    next_id: u64,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn(&mut self, node: SceneNode) -> InstanceId {
        self.next_id += 1;
        let id = InstanceId::new(self.next_id);
        self.slots.insert(
            id,
            Slot {
                node,
                parent: None,
                attached: Vec::new(),
            },
        );
        id
    }

    /// Node tree of an instance with attached instances folded in as children
    pub fn assemble(&self, instance: InstanceId) -> RuntimeResult<SceneNode> {
        let slot = self.slots.get(&instance).ok_or(RuntimeError::UnknownInstance(instance))?;
        let mut node = slot.node.clone();
        for &child in &slot.attached {
            node.children.push(self.assemble(child)?);
        }
        Ok(node)
    }

    fn is_ancestor(&self, candidate: InstanceId, of: InstanceId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.slots.get(&id).and_then(|s| s.parent);
        }
        false
    }

    fn detach(&mut self, instance: InstanceId) {
        let parent = self.slots.get_mut(&instance).and_then(|s| s.parent.take());
        if let Some(parent) = parent.and_then(|p| self.slots.get_mut(&p)) {
            parent.attached.retain(|&c| c != instance);
        }
    }
}

impl SceneRuntime for SceneWorld {
    fn instantiate_model(&mut self, source: &AssetPath, model: &SourceModel) -> RuntimeResult<InstanceId> {
        let mut node = model.root.clone();
        node.prefab_link = Some(source.clone());
        Ok(self.spawn(node))
    }

    fn instantiate_prefab(&mut self, store: &dyn AssetStore, prefab: &PrefabHandle) -> RuntimeResult<InstanceId> {
        let asset = store
            .load_prefab(&prefab.path)?
            .ok_or_else(|| RuntimeError::PrefabNotFound(prefab.path.clone()))?;
        let mut node = asset.root;
        node.prefab_link = Some(prefab.path.clone());
        Ok(self.spawn(node))
    }

    fn create_empty(&mut self, name: &str) -> InstanceId {
        self.spawn(SceneNode::new(name))
    }

    fn set_parent(&mut self, child: InstanceId, parent: InstanceId) -> RuntimeResult<()> {
        if !self.slots.contains_key(&child) {
            return Err(RuntimeError::UnknownInstance(child));
        }
        if !self.slots.contains_key(&parent) {
            return Err(RuntimeError::UnknownInstance(parent));
        }
        if self.is_ancestor(child, parent) {
            return Err(RuntimeError::ParentCycle { child, parent });
        }

        self.detach(child);
        if let Some(slot) = self.slots.get_mut(&child) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.attached.push(child);
        }
        Ok(())
    }

    fn unpack_completely(&mut self, instance: InstanceId) -> RuntimeResult<()> {
        let attached = {
            let slot = self.slots.get_mut(&instance).ok_or(RuntimeError::UnknownInstance(instance))?;
            slot.node.unpack_completely();
            slot.attached.clone()
        };
        for child in attached {
            self.unpack_completely(child)?;
        }
        Ok(())
    }

    fn node_mut(&mut self, instance: InstanceId) -> Option<&mut SceneNode> {
        self.slots.get_mut(&instance).map(|s| &mut s.node)
    }

    fn save_prefab(
        &mut self,
        store: &mut dyn AssetStore,
        instance: InstanceId,
        path: &AssetPath,
    ) -> RuntimeResult<PrefabHandle> {
        let root = self.assemble(instance)?;
        let name = root.name.clone();
        store.write_prefab(path, PrefabAsset::new(root))?;
        log::debug!("Saved prefab '{}' to {}", name, path);
        Ok(PrefabHandle {
            path: path.clone(),
            name,
        })
    }

    fn destroy_scratch_instance(&mut self, instance: InstanceId) -> bool {
        if !self.slots.contains_key(&instance) {
            return false;
        }
        self.detach(instance);

        let mut pending = vec![instance];
        while let Some(id) = pending.pop() {
            if let Some(slot) = self.slots.remove(&id) {
                pending.extend(slot.attached);
            }
        }
        true
    }

    fn live_instances(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_artifact::MemoryStore;

    #[test]
    fn test_attach_assemble_destroy() {
        let mut world = SceneWorld::new();
        let root = world.create_empty("Root");
        let child = world.create_empty("Child");
        let leaf = world.create_empty("Leaf");

        world.set_parent(child, root).unwrap();
        world.set_parent(leaf, child).unwrap();

        let tree = world.assemble(root).unwrap();
        assert_eq!(tree.children[0].name, "Child");
        assert_eq!(tree.children[0].children[0].name, "Leaf");

        assert!(world.destroy_scratch_instance(root));
        assert_eq!(world.live_instances(), 0);
        assert!(!world.destroy_scratch_instance(root));
    }

    #[test]
    fn test_cycles_rejected() {
        let mut world = SceneWorld::new();
        let a = world.create_empty("A");
        let b = world.create_empty("B");
        world.set_parent(b, a).unwrap();

        assert_eq!(world.set_parent(a, b), Err(RuntimeError::ParentCycle { child: a, parent: b }));
        assert_eq!(world.set_parent(a, a), Err(RuntimeError::ParentCycle { child: a, parent: a }));
    }

    #[test]
    fn test_destroying_child_detaches_it() {
        let mut world = SceneWorld::new();
        let root = world.create_empty("Root");
        let child = world.create_empty("Child");
        world.set_parent(child, root).unwrap();

        world.destroy_scratch_instance(child);
        assert!(world.assemble(root).unwrap().children.is_empty());
        assert_eq!(world.live_instances(), 1);
    }

    #[test]
    fn test_prefab_instance_is_linked() {
        let mut store = MemoryStore::new();
        let dir = AssetPath::new("Assets/Prefabs");
        store.create_directory_all(&dir).unwrap();

        let mut world = SceneWorld::new();
        let node = world.create_empty("Thing");
        let handle = world.save_prefab(&mut store, node, &dir.join("Thing.prefab")).unwrap();
        assert_eq!(handle.name, "Thing");

        let instance = world.instantiate_prefab(&store, &handle).unwrap();
        assert_eq!(world.node_mut(instance).unwrap().prefab_link.as_ref(), Some(&handle.path));

        world.unpack_completely(instance).unwrap();
        assert!(world.node_mut(instance).unwrap().prefab_link.is_none());

        let missing = PrefabHandle {
            path: dir.join("Missing.prefab"),
            name: "Missing".into(),
        };
        assert_eq!(
            world.instantiate_prefab(&store, &missing),
            Err(RuntimeError::PrefabNotFound(missing.path.clone()))
        );
    }
}
