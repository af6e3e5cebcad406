//! Import pipeline - per-asset orchestration of sync and prefab builds
//!
//! For every imported model the pipeline runs, strictly in order:
//!
//! 1. mesh artifact sync into the container next to the source
//! 2. visual prefab build, then a check that it binds only artifacts
//! 3. mechanic prefab build (only when none exists yet)
//! 4. deletion of the source asset
//!
//! Deleting the source is the only completion signal. Any failure aborts the
//! asset's run before that step, so the next import retries it. A flush that
//! fails after the deletion is logged and does not fail the run.

use std::collections::BTreeSet;

use void_artifact::{AssetPath, AssetStore, PrefabHandle};

use crate::config::PipelineConfig;
use crate::error::{ImportError, Result};
use crate::mechanic::{build_mechanic_prefab, MechanicOutcome};
use crate::naming::TargetPaths;
use crate::runtime::SceneRuntime;
use crate::settings::ModelImportSettings;
use crate::sync::{synchronize, SyncReport};
use crate::visual::build_visual_prefab;

/// Result of one asset's completed run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Source asset that was consumed
    pub source: AssetPath,
    pub sync: SyncReport,
    pub visual: PrefabHandle,
    pub mechanic: MechanicOutcome,
}

impl ImportOutcome {
    pub fn container(&self) -> &AssetPath {
        &self.sync.container
    }
}

/// Result of one notification batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub imported: Vec<ImportOutcome>,
    /// Assets whose run aborted; their sources are left in place
    pub failed: Vec<(AssetPath, ImportError)>,
    /// Paths outside the extension allow-list
    pub ignored: Vec<AssetPath>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of assets the pipeline attempted
    pub fn processed(&self) -> usize {
        self.imported.len() + self.failed.len()
    }
}

/// The model import pipeline
pub struct ImportPipeline<S: AssetStore, R: SceneRuntime> {
    store: S,
    runtime: R,
    config: PipelineConfig,
}

impl<S: AssetStore, R: SceneRuntime> ImportPipeline<S, R> {
    /// Create a pipeline over its collaborators
    pub fn new(store: S, runtime: R, config: PipelineConfig) -> Self {
        Self { store, runtime, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Whether `path` is a model this pipeline handles
    pub fn accepts(&self, path: &AssetPath) -> bool {
        path.has_extension_in(&self.config.extensions)
    }

    /// Pre-import hook: apply the configured import settings
    ///
    /// Returns false and leaves `settings` untouched for paths outside the
    /// allow-list.
    pub fn preprocess_model(&self, path: &AssetPath, settings: &mut ModelImportSettings) -> bool {
        if !self.accepts(path) {
            return false;
        }
        *settings = self.config.import.clone();
        log::debug!("Configured import settings for {}", path);
        true
    }

    /// Handle one batch of completed imports
    ///
    /// Each accepted path is processed at most once per batch, in the order
    /// given. A failed asset is logged and skipped; the rest of the batch
    /// still runs.
    pub fn on_imports_completed(&mut self, paths: &[AssetPath]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut seen = BTreeSet::new();

        for path in paths {
            if !self.accepts(path) {
                report.ignored.push(path.clone());
                continue;
            }
            if !seen.insert(path.clone()) {
                log::debug!("Skipping duplicate notification for {}", path);
                continue;
            }

            match self.process_asset(path) {
                Ok(outcome) => report.imported.push(outcome),
                Err(e) => {
                    log::warn!("Import of {} failed ({:?}): {}", path, e.category(), e);
                    report.failed.push((path.clone(), e));
                }
            }
        }

        if !report.imported.is_empty() || !report.failed.is_empty() {
            log::info!(
                "Import batch done: {} imported, {} failed, {} ignored",
                report.imported.len(),
                report.failed.len(),
                report.ignored.len()
            );
        }

        report
    }

    /// Run the full pipeline for one source asset
    pub fn process_asset(&mut self, source: &AssetPath) -> Result<ImportOutcome> {
        let targets = TargetPaths::for_source(source, &self.config)?;
        log::info!("Importing {}", source);

        let mut model = self
            .store
            .load_model(source)?
            .ok_or_else(|| ImportError::SourceMissing(source.clone()))?;

        let sync = synchronize(&mut self.store, &mut model, &targets.container)?;

        let visual = build_visual_prefab(
            &mut self.store,
            &mut self.runtime,
            source,
            &model,
            &targets.visual_prefab,
        )?;
        self.verify_visual(&visual, &model.name)?;

        let mechanic = build_mechanic_prefab(
            &mut self.store,
            &mut self.runtime,
            Some(&visual),
            &targets.mechanic_prefab,
        )?;

        // Deletion marks the run complete; nothing after it may fail the run
        self.store.delete(source)?;
        if let Err(e) = self.store.save() {
            log::warn!("Flush after removing {} failed: {}", source, e);
        }
        log::info!("Import of {} complete, source removed", source);

        Ok(ImportOutcome {
            source: source.clone(),
            sync,
            visual,
            mechanic,
        })
    }

    /// The saved visual prefab must exist and bind only artifacts
    fn verify_visual(&self, visual: &PrefabHandle, model_name: &str) -> Result<()> {
        let saved = self
            .store
            .load_prefab(&visual.path)?
            .ok_or_else(|| ImportError::MissingDependency {
                target: visual.path.clone(),
                visual: None,
            })?;

        if saved.root.has_source_bindings() {
            return Err(ImportError::UnboundSourceMesh {
                model: model_name.to_string(),
            });
        }
        Ok(())
    }
}
