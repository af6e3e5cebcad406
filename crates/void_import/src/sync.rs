//! Mesh artifact synchronizer
//!
//! Mirrors the meshes of a freshly imported source model into a persistent
//! container. Artifacts are matched to source meshes by derived name:
//!
//! - name only in the source: clone the mesh into a new artifact
//! - name in both: overwrite the artifact in place, keeping its identity
//! - name only in the container: destroy the artifact
//!
//! The full diff is computed up front as a [`SyncPlan`]; nothing is written
//! until the plan is known to be consistent.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use void_artifact::{ArtifactRef, AssetPath, AssetStore, SourceModel, StoreError, SubAsset, SubAssetId};

use crate::naming::artifact_name;

/// Synchronization errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Two existing artifacts share a name, so matching is ambiguous
    #[error("container {container} holds {count} artifacts named '{name}'")]
    MatchAmbiguity {
        container: AssetPath,
        name: String,
        count: usize,
    },

    /// A node binds a source mesh index the model does not have
    #[error("model '{model}' binds source mesh #{index} but has {mesh_count} meshes")]
    DanglingBinding {
        model: String,
        index: usize,
        mesh_count: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create/update/destroy sets for one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Source mesh indices that get a new artifact
    pub create: Vec<usize>,
    /// Source mesh index paired with the artifact it overwrites
    pub update: Vec<(usize, SubAssetId)>,
    /// Artifacts with no source mesh left
    pub destroy: Vec<(SubAssetId, String)>,
    /// Source meshes whose name collides with an earlier one: (duplicate, primary)
    pub aliases: Vec<(usize, usize)>,
}

impl SyncPlan {
    /// Diff the model's bound meshes against a container's sub-assets
    pub fn compute(
        model: &SourceModel,
        container: &AssetPath,
        existing: &[SubAsset],
    ) -> Result<Self, SyncError> {
        let mut plan = Self::default();

        // Derived name -> first source mesh carrying it
        let mut wanted: BTreeMap<String, usize> = BTreeMap::new();
        for index in model.bound_mesh_indices() {
            let mesh = model.meshes.get(index).ok_or_else(|| SyncError::DanglingBinding {
                model: model.name.clone(),
                index,
                mesh_count: model.meshes.len(),
            })?;

            let name = artifact_name(&mesh.name);
            match wanted.get(&name) {
                Some(&primary) => {
                    log::warn!(
                        "Model '{}' has several meshes named '{}'; binding mesh #{} to the artifact of mesh #{}",
                        model.name, mesh.name, index, primary
                    );
                    plan.aliases.push((index, primary));
                }
                None => {
                    wanted.insert(name, index);
                }
            }
        }

        let mut by_name: HashMap<&str, Vec<SubAssetId>> = HashMap::new();
        for sub in existing {
            by_name.entry(sub.name()).or_default().push(sub.id);
        }
        if let Some((name, ids)) = by_name.iter().find(|(_, ids)| ids.len() > 1) {
            return Err(SyncError::MatchAmbiguity {
                container: container.clone(),
                name: name.to_string(),
                count: ids.len(),
            });
        }

        for (name, &index) in &wanted {
            match by_name.get(name.as_str()) {
                Some(ids) => plan.update.push((index, ids[0])),
                None => plan.create.push(index),
            }
        }

        for sub in existing {
            if !wanted.contains_key(sub.name()) {
                plan.destroy.push((sub.id, sub.name().to_string()));
            }
        }

        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.destroy.is_empty()
    }
}

/// What a synchronization did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub container: AssetPath,
    /// Container did not exist before this run
    pub created_container: bool,
    /// Artifact names, sorted
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub destroyed: Vec<String>,
}

/// Bring `container` in line with `model` and rebind the model to artifacts
///
/// The model is only rebound once every store write and the final flush have
/// succeeded; on error it is left untouched.
pub fn synchronize<S: AssetStore + ?Sized>(
    store: &mut S,
    model: &mut SourceModel,
    container: &AssetPath,
) -> Result<SyncReport, SyncError> {
    let exists = store.path_exists(container);
    let existing = if exists {
        store.load_all_sub_assets(container)?
    } else {
        Vec::new()
    };

    let plan = SyncPlan::compute(model, container, &existing)?;
    if plan.is_empty() {
        log::debug!("Model '{}' binds no meshes; {} stays empty", model.name, container);
    }
    let mut report = SyncReport {
        container: container.clone(),
        created_container: !exists,
        created: Vec::with_capacity(plan.create.len()),
        updated: Vec::with_capacity(plan.update.len()),
        destroyed: Vec::with_capacity(plan.destroy.len()),
    };

    if !exists {
        store.create_container(container)?;
        log::info!("Created mesh container {}", container);
    }

    let mut bindings: Vec<(usize, SubAssetId)> = Vec::with_capacity(plan.create.len() + plan.update.len());

    for &(index, id) in &plan.update {
        let source = &model.meshes[index];
        let name = artifact_name(&source.name);

        // Capture before the copy: the store may re-derive normals while
        // copying, which shows seams on meshes with authored normals
        let normals = source.normals();
        let mut contents = source.clone();
        contents.name.clone_from(&name);

        store.copy_serialized(container, id, &contents)?;
        store.set_normals(container, id, &normals)?;

        log::debug!("Updated artifact {} ({})", name, id);
        bindings.push((index, id));
        report.updated.push(name);
    }

    for &index in &plan.create {
        let mut artifact = model.meshes[index].clone();
        artifact.name = artifact_name(&artifact.name);
        let name = artifact.name.clone();

        let id = store.attach_sub_asset(container, artifact)?;

        log::debug!("Created artifact {} ({})", name, id);
        bindings.push((index, id));
        report.created.push(name);
    }

    for (id, name) in &plan.destroy {
        store.destroy_sub_asset(container, *id)?;
        log::debug!("Destroyed artifact {} ({})", name, id);
        report.destroyed.push(name.clone());
    }

    store.save()?;

    let mut resolved: HashMap<usize, SubAssetId> = bindings.iter().copied().collect();
    for &(duplicate, primary) in &plan.aliases {
        if let Some(&id) = resolved.get(&primary) {
            resolved.insert(duplicate, id);
        }
    }
    for (index, id) in resolved {
        model.rebind(
            index,
            &ArtifactRef {
                container: container.clone(),
                id,
            },
        );
    }

    report.created.sort();
    report.updated.sort();
    report.destroyed.sort();

    log::info!(
        "Synchronized {}: {} created, {} updated, {} destroyed",
        container,
        report.created.len(),
        report.updated.len(),
        report.destroyed.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_artifact::{MemoryStore, Mesh, MeshBinding, SceneNode, StoreOp, Vertex};

    const SOURCE: &str = "Assets/Models/Robot/Robot.fbx";
    const CONTAINER: &str = "Assets/Models/Robot/Robot.asset";

    fn mesh(name: &str, y: f32) -> Mesh {
        let n = [0.0, 0.6, 0.8];
        Mesh::new(
            name,
            vec![
                Vertex::new([0.0, y, 0.0], n, [0.0, 0.0]),
                Vertex::new([1.0, y, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.0, y, 1.0], n, [0.0, 1.0]),
            ],
            vec![0, 2, 1],
        )
    }

    fn model(names: &[&str]) -> SourceModel {
        let mut root = SceneNode::new("Robot");
        let mut meshes = Vec::new();
        for (i, name) in names.iter().enumerate() {
            root.children.push(SceneNode::new(*name).with_mesh(MeshBinding::Source(i)));
            meshes.push(mesh(name, i as f32));
        }
        SourceModel::new("Robot", root, meshes)
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_model(SOURCE, model(&[]));
        store
    }

    #[test]
    fn test_first_import_creates_everything() {
        let mut store = store();
        let container = AssetPath::new(CONTAINER);
        let mut m = model(&["Arm", "Leg"]);

        let report = synchronize(&mut store, &mut m, &container).unwrap();

        assert!(report.created_container);
        assert_eq!(report.container, container);
        assert_eq!(report.created, vec!["Arm_!Artifact", "Leg_!Artifact"]);
        assert!(report.updated.is_empty());
        assert!(report.destroyed.is_empty());
        assert!(!m.has_source_bindings());
        assert_eq!(store.container(&container).unwrap().names(), report.created);
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_plan_is_a_set_difference() {
        let container = AssetPath::new(CONTAINER);
        let existing = vec![
            SubAsset { id: SubAssetId::new(1), mesh: Mesh { name: "Arm_!Artifact".into(), ..Default::default() } },
            SubAsset { id: SubAssetId::new(2), mesh: Mesh { name: "Leg_!Artifact".into(), ..Default::default() } },
        ];
        let plan = SyncPlan::compute(&model(&["Arm", "Torso"]), &container, &existing).unwrap();

        assert_eq!(plan.update, vec![(0, SubAssetId::new(1))]);
        assert_eq!(plan.create, vec![1]);
        assert_eq!(plan.destroy, vec![(SubAssetId::new(2), "Leg_!Artifact".to_string())]);
        assert!(plan.aliases.is_empty());
        assert!(!plan.is_empty());

        let empty = SyncPlan::compute(&model(&[]), &container, &[]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_duplicate_artifacts_are_ambiguous() {
        let container = AssetPath::new(CONTAINER);
        let existing = vec![
            SubAsset { id: SubAssetId::new(1), mesh: Mesh { name: "Arm_!Artifact".into(), ..Default::default() } },
            SubAsset { id: SubAssetId::new(2), mesh: Mesh { name: "Arm_!Artifact".into(), ..Default::default() } },
        ];
        let err = SyncPlan::compute(&model(&["Arm"]), &container, &existing).unwrap_err();
        assert!(matches!(err, SyncError::MatchAmbiguity { count: 2, .. }));
    }

    #[test]
    fn test_duplicate_source_names_share_one_artifact() {
        let mut store = store();
        let container = AssetPath::new(CONTAINER);
        let mut m = model(&["Arm", "Arm"]);

        let report = synchronize(&mut store, &mut m, &container).unwrap();
        assert_eq!(report.created, vec!["Arm_!Artifact"]);

        let bindings = m.root.bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0], bindings[1]);
    }

    #[test]
    fn test_dangling_binding_rejected() {
        let mut store = store();
        let mut m = model(&["Arm"]);
        m.root.children.push(SceneNode::new("Ghost").with_mesh(MeshBinding::Source(5)));

        let err = synchronize(&mut store, &mut m, &AssetPath::new(CONTAINER)).unwrap_err();
        assert!(matches!(err, SyncError::DanglingBinding { index: 5, .. }));
        assert!(!store.path_exists(&AssetPath::new(CONTAINER)));
    }

    #[test]
    fn test_failed_attach_leaves_model_unbound() {
        let mut store = store();
        store.fail_on(StoreOp::AttachSubAsset, CONTAINER);
        let mut m = model(&["Arm"]);

        let err = synchronize(&mut store, &mut m, &AssetPath::new(CONTAINER)).unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Rejected { .. })));
        assert!(m.has_source_bindings());
    }

    #[test]
    fn test_unchanged_resync_is_stable() {
        let mut store = store();
        let container = AssetPath::new(CONTAINER);

        synchronize(&mut store, &mut model(&["Arm", "Leg"]), &container).unwrap();
        let first = store.container(&container).unwrap();

        let report = synchronize(&mut store, &mut model(&["Arm", "Leg"]), &container).unwrap();
        assert!(!report.created_container);
        assert_eq!(report.updated, vec!["Arm_!Artifact", "Leg_!Artifact"]);
        assert!(report.created.is_empty() && report.destroyed.is_empty());
        assert_eq!(store.container(&container).unwrap(), first);
    }
}
