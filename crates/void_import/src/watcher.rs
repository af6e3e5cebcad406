//! Filesystem import notifications
//!
//! Watches a project root and batches created or modified model files as
//! store-relative [`AssetPath`]s, ready for
//! [`ImportPipeline::on_imports_completed`](crate::ImportPipeline::on_imports_completed).

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use thiserror::Error;
use void_artifact::AssetPath;

/// Watcher errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("failed to watch {path:?}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Store-relative path of `path` under `root`
///
/// `None` when `path` lies outside `root`, is the root itself, or contains
/// components that cannot appear in an asset path.
pub fn to_asset_path(root: &Path, path: &Path) -> Option<AssetPath> {
    let relative = path.strip_prefix(root).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(AssetPath::new(segments.join("/")))
}

/// Import notification source backed by `notify`
pub struct ImportWatcher {
    watcher: notify::RecommendedWatcher,
    rx: crossbeam_channel::Receiver<notify::Result<Event>>,
    root: PathBuf,
    extensions: Vec<String>,
    /// Last time each path was reported
    debounce: HashMap<PathBuf, Instant>,
    debounce_duration: Duration,
}

impl ImportWatcher {
    /// Create a watcher for model files with the given extensions under `root`
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Result<Self, WatchError> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(WatchError::Create)?;

        Ok(Self {
            watcher,
            rx,
            root: root.into(),
            extensions,
            debounce: HashMap::new(),
            debounce_duration: Duration::from_millis(250),
        })
    }

    /// Start watching the root recursively
    pub fn start(&mut self) -> Result<(), WatchError> {
        self.watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: self.root.clone(),
                source,
            })?;

        log::info!("Watching {:?} for model imports", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn set_debounce(&mut self, duration: Duration) {
        self.debounce_duration = duration;
    }

    /// Drain pending events into one batch of model paths
    pub fn poll(&mut self) -> Vec<AssetPath> {
        let mut batch: Vec<AssetPath> = Vec::new();
        let now = Instant::now();

        while let Ok(result) = self.rx.try_recv() {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("File watcher error: {}", e);
                    continue;
                }
            };

            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }

            for path in event.paths {
                if path.is_dir() {
                    continue;
                }
                let Some(asset) = to_asset_path(&self.root, &path) else {
                    continue;
                };
                if !asset.has_extension_in(&self.extensions) {
                    continue;
                }

                if let Some(last) = self.debounce.get(&path) {
                    if now.duration_since(*last) < self.debounce_duration {
                        continue;
                    }
                }
                self.debounce.insert(path, now);

                if !batch.contains(&asset) {
                    batch.push(asset);
                }
            }
        }

        self.debounce.retain(|_, time| now.duration_since(*time) < Duration::from_secs(5));

        if !batch.is_empty() {
            log::debug!("File watcher batch: {} model(s)", batch.len());
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_asset_path() {
        let root = Path::new("/project");

        assert_eq!(
            to_asset_path(root, Path::new("/project/Assets/Models/Robot/Robot.fbx")),
            Some(AssetPath::new("Assets/Models/Robot/Robot.fbx"))
        );
        assert_eq!(
            to_asset_path(root, Path::new("/project/./Assets/a.fbx")),
            Some(AssetPath::new("Assets/a.fbx"))
        );
        assert_eq!(to_asset_path(root, Path::new("/project")), None);
        assert_eq!(to_asset_path(root, Path::new("/elsewhere/a.fbx")), None);
        assert_eq!(to_asset_path(root, Path::new("/project/Assets/../a.fbx")), None);
    }

    fn poll_until(watcher: &mut ImportWatcher, timeout: Duration) -> Vec<AssetPath> {
        let deadline = Instant::now() + timeout;
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(watcher.poll());
            if !seen.is_empty() {
                // Let trailing events for the same write arrive
                std::thread::sleep(Duration::from_millis(100));
                seen.extend(watcher.poll());
                return seen;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        seen
    }

    #[test]
    fn test_watcher_reports_new_models_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let models = root.join("Assets/Models/Robot");
        std::fs::create_dir_all(&models).unwrap();

        let mut watcher = ImportWatcher::new(root.clone(), vec!["fbx".into()]).unwrap();
        assert_eq!(watcher.root(), root.as_path());
        watcher.set_debounce(Duration::from_secs(60));
        watcher.start().unwrap();
        assert!(watcher.poll().is_empty());

        std::fs::write(root.join("Assets/readme.png"), b"png").unwrap();
        std::fs::write(models.join("Robot.FBX"), b"model").unwrap();

        let batch = poll_until(&mut watcher, Duration::from_secs(5));
        assert_eq!(batch, vec![AssetPath::new("Assets/Models/Robot/Robot.FBX")]);

        // Rewrites inside the debounce window are folded into the first report
        std::fs::write(models.join("Robot.FBX"), b"model v2").unwrap();
        std::thread::sleep(Duration::from_millis(200));
        assert!(watcher.poll().is_empty());
    }
}
