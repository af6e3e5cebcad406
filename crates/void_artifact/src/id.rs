//! Identifiers for stored sub-assets and scratch scene instances

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identity of a sub-asset inside the store
///
/// Stays the same when a sub-asset's contents are overwritten in place, which
/// is what lets prefabs keep pointing at an artifact across re-imports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubAssetId(pub u64);

impl SubAssetId {
    /// Create a new sub-asset ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get raw ID value
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scratch scene instance held by a scene runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl InstanceId {
    /// Create a new instance ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get raw ID value
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}
