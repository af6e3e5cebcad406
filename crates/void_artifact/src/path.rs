//! Asset paths
//!
//! Store-relative, `/`-separated paths. All derived artifact locations are
//! computed from these with plain string operations, so two runs over the
//! same source always land on the same targets.

use core::fmt;
use serde::{Deserialize, Serialize};

/// A `/`-separated path relative to the asset store root
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    /// Create a path, normalizing `\` separators to `/`
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.contains('\\') {
            Self(path.replace('\\', "/"))
        } else {
            Self(path)
        }
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent directory, or `None` for a path without a `/`
    pub fn parent(&self) -> Option<AssetPath> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Last path segment without its extension
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Extension without the leading dot
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Case-insensitive check against an extension allow-list
    pub fn has_extension_in<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        let Some(ext) = self.extension() else {
            return false;
        };
        allowed
            .iter()
            .any(|a| a.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Replace the extension (or append one if there is none)
    pub fn with_extension(&self, ext: &str) -> AssetPath {
        let ext = ext.trim_start_matches('.');
        let stem = self.file_stem();
        match self.parent() {
            Some(parent) => Self(format!("{}/{}.{}", parent.0, stem, ext)),
            None => Self(format!("{}.{}", stem, ext)),
        }
    }

    /// Append a segment
    pub fn join(&self, segment: &str) -> AssetPath {
        let segment = segment.trim_start_matches('/');
        if self.0.is_empty() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.0.trim_end_matches('/'), segment))
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let path = AssetPath::new("Assets/Models/Robot/Robot.FBX");
        assert_eq!(path.parent().unwrap().as_str(), "Assets/Models/Robot");
        assert_eq!(path.file_name(), "Robot.FBX");
        assert_eq!(path.file_stem(), "Robot");
        assert_eq!(path.extension(), Some("FBX"));
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let path = AssetPath::new("a/b/model.Fbx");
        assert!(path.has_extension_in(&["fbx"]));
        assert!(path.has_extension_in(&[".FBX"]));
        assert!(!path.has_extension_in(&["obj"]));
        assert!(!AssetPath::new("a/b/noext").has_extension_in(&["fbx"]));
    }

    #[test]
    fn test_with_extension() {
        let path = AssetPath::new("Assets/Models/Robot/Robot.fbx");
        assert_eq!(path.with_extension("asset").as_str(), "Assets/Models/Robot/Robot.asset");
        assert_eq!(AssetPath::new("Robot.v2.fbx").with_extension(".asset").as_str(), "Robot.v2.asset");
    }

    #[test]
    fn test_backslashes_normalized() {
        let path = AssetPath::new("Assets\\Models\\Arm.fbx");
        assert_eq!(path.as_str(), "Assets/Models/Arm.fbx");
        assert_eq!(path.join("x").as_str(), "Assets/Models/Arm.fbx/x");
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let path = AssetPath::new("dir/.hidden");
        assert_eq!(path.extension(), None);
        assert_eq!(path.file_stem(), ".hidden");
    }
}
