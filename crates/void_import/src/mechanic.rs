//! Mechanic prefab builder
//!
//! The mechanic prefab wraps the visual prefab for gameplay use:
//!
//! ```text
//! Robot                 (root, named after the model)
//! └── Visual            (fixed name)
//!     └── Robot_!Visual (linked instance of the visual prefab)
//! ```
//!
//! It is created once and never regenerated, so edits layered onto it by
//! hand survive every later import.

use void_artifact::{AssetPath, AssetStore, InstanceId, PrefabHandle};

use crate::error::{ImportError, Result};
use crate::naming::{strip_visual_suffix, VISUAL_CHILD_NAME};
use crate::runtime::SceneRuntime;

/// Result of a mechanic prefab build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechanicOutcome {
    /// A new mechanic prefab was written
    Created(PrefabHandle),
    /// A prefab already existed at the target and was left alone
    Kept(AssetPath),
}

impl MechanicOutcome {
    pub fn path(&self) -> &AssetPath {
        match self {
            Self::Created(handle) => &handle.path,
            Self::Kept(path) => path,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Create the mechanic prefab at `target` unless something is already there
pub fn build_mechanic_prefab<S: AssetStore, R: SceneRuntime>(
    store: &mut S,
    runtime: &mut R,
    visual: Option<&PrefabHandle>,
    target: &AssetPath,
) -> Result<MechanicOutcome> {
    if store.path_exists(target) {
        log::info!("Mechanic prefab {} exists, keeping it", target);
        return Ok(MechanicOutcome::Kept(target.clone()));
    }

    let missing = || ImportError::MissingDependency {
        target: target.clone(),
        visual: visual.map(|v| v.path.clone()),
    };
    let visual = visual.ok_or_else(missing)?;
    if store.load_prefab(&visual.path)?.is_none() {
        return Err(missing());
    }

    if let Some(dir) = target.parent() {
        store.create_directory_all(&dir)?;
    }

    let root = runtime.create_empty(strip_visual_suffix(&visual.name));
    let saved = assemble_and_save(store, runtime, root, visual, target);
    runtime.destroy_scratch_instance(root);
    let handle = saved?;

    store.save()?;
    log::info!("Created mechanic prefab '{}' at {}", handle.name, handle.path);
    Ok(MechanicOutcome::Created(handle))
}

fn assemble_and_save<S: AssetStore, R: SceneRuntime>(
    store: &mut S,
    runtime: &mut R,
    root: InstanceId,
    visual: &PrefabHandle,
    target: &AssetPath,
) -> Result<PrefabHandle> {
    let holder = runtime.create_empty(VISUAL_CHILD_NAME);
    runtime.set_parent(holder, root)?;

    let instance = runtime.instantiate_prefab(&*store, visual)?;
    runtime.set_parent(instance, holder)?;

    Ok(runtime.save_prefab(store, root, target)?)
}
