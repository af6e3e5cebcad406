//! Visual prefab builder

use void_artifact::{AssetPath, AssetStore, InstanceId, PrefabHandle, SourceModel};

use crate::error::{ImportError, Result};
use crate::naming::visual_name;
use crate::runtime::{RuntimeError, SceneRuntime};

/// Save a static, unpacked copy of an artifact-bound model as a prefab
///
/// The model must already be rebound to container artifacts. The visual
/// prefab is rewritten on every import.
pub fn build_visual_prefab<S: AssetStore, R: SceneRuntime>(
    store: &mut S,
    runtime: &mut R,
    source: &AssetPath,
    model: &SourceModel,
    target: &AssetPath,
) -> Result<PrefabHandle> {
    if model.has_source_bindings() {
        return Err(ImportError::UnboundSourceMesh {
            model: model.name.clone(),
        });
    }

    if let Some(dir) = target.parent() {
        store.create_directory_all(&dir)?;
    }

    let instance = runtime.instantiate_model(source, model)?;
    let saved = populate_and_save(store, runtime, instance, &model.name, target);
    runtime.destroy_scratch_instance(instance);
    let handle = saved?;

    store.save()?;
    log::info!("Saved visual prefab '{}' to {}", handle.name, handle.path);
    Ok(handle)
}

fn populate_and_save<S: AssetStore, R: SceneRuntime>(
    store: &mut S,
    runtime: &mut R,
    instance: InstanceId,
    base_name: &str,
    target: &AssetPath,
) -> Result<PrefabHandle> {
    runtime.unpack_completely(instance)?;

    let root = runtime
        .node_mut(instance)
        .ok_or(RuntimeError::UnknownInstance(instance))?;
    root.name = visual_name(base_name);
    root.set_static_recursive(true);

    Ok(runtime.save_prefab(store, instance, target)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SceneWorld;
    use void_artifact::{ArtifactRef, MemoryStore, MeshBinding, SceneNode, StoreError, StoreOp, SubAssetId};

    const SOURCE: &str = "Assets/Models/Robot/Robot.fbx";
    const TARGET: &str = "Assets/Models/Prefabs/VisualPrefabs/Robot_!VisualPrefab.prefab";

    fn bound_model() -> SourceModel {
        let artifact = ArtifactRef {
            container: AssetPath::new("Assets/Models/Robot/Robot.asset"),
            id: SubAssetId::new(1),
        };
        let root = SceneNode::new("Robot").with_child(
            SceneNode::new("Arm").with_mesh(MeshBinding::Artifact(artifact)),
        );
        SourceModel::new("Robot", root, Vec::new())
    }

    #[test]
    fn test_visual_prefab_is_static_and_unpacked() {
        let mut store = MemoryStore::new();
        let mut world = SceneWorld::new();

        let handle = build_visual_prefab(
            &mut store,
            &mut world,
            &AssetPath::new(SOURCE),
            &bound_model(),
            &AssetPath::new(TARGET),
        )
        .unwrap();

        assert_eq!(handle.name, "Robot_!Visual");
        assert_eq!(world.live_instances(), 0);

        let prefab = store.prefab(&AssetPath::new(TARGET)).unwrap();
        let mut all_static = true;
        let mut linked = false;
        prefab.root.visit(&mut |n| {
            all_static &= n.is_static;
            linked |= n.prefab_link.is_some();
        });
        assert!(all_static);
        assert!(!linked);
        assert_eq!(prefab.root.find_child("Arm").unwrap().mesh.as_ref().map(|b| matches!(b, MeshBinding::Artifact(_))), Some(true));
    }

    #[test]
    fn test_unbound_model_rejected() {
        let mut store = MemoryStore::new();
        let mut world = SceneWorld::new();
        let model = SourceModel::new(
            "Robot",
            SceneNode::new("Robot").with_mesh(MeshBinding::Source(0)),
            Vec::new(),
        );

        let err = build_visual_prefab(&mut store, &mut world, &AssetPath::new(SOURCE), &model, &AssetPath::new(TARGET))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnboundSourceMesh { .. }));
        assert!(!store.path_exists(&AssetPath::new(TARGET)));
    }

    #[test]
    fn test_rejected_save_cleans_up_scratch_instance() {
        let mut store = MemoryStore::new();
        store.fail_on(StoreOp::WritePrefab, TARGET);
        let mut world = SceneWorld::new();

        let err = build_visual_prefab(
            &mut store,
            &mut world,
            &AssetPath::new(SOURCE),
            &bound_model(),
            &AssetPath::new(TARGET),
        )
        .unwrap_err();

        assert!(matches!(err, ImportError::Runtime(RuntimeError::Store(StoreError::Rejected { .. }))));
        assert_eq!(world.live_instances(), 0);
    }
}
