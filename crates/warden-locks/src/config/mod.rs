//! Engine configuration
//!
//! Configuration covers engine construction only. Whether an unregulated
//! action is denied is always decided per call, never configured here.

pub mod env;
pub mod loader;
pub mod world;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use env::EnvOverrides;
pub use loader::{ConfigFormat, ConfigLoader};
pub use world::World;

/// Default number of parsed permission strings kept in memory
pub const DEFAULT_PARSE_CACHE_CAPACITY: usize = 512;

/// Default number of audit entries kept before the oldest are evicted
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Default action-type for ad-hoc lock lists
pub const DEFAULT_ADHOC_ACTION_TYPE: &str = "adhoc";

/// Lock engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parsed strings to memoise; 0 disables the cache
    pub parse_cache_capacity: usize,
    /// Record every decision in an audit log
    pub audit: bool,
    /// Audit entries kept; 0 keeps everything
    pub audit_capacity: usize,
    /// Action-type used for ad-hoc lock lists
    pub adhoc_action_type: String,
    /// Permission names from lowest to highest, for `perm`/`perm_above`
    pub permission_hierarchy: Vec<String>,
    /// Permission groups seeding the in-memory group store
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parse_cache_capacity: DEFAULT_PARSE_CACHE_CAPACITY,
            audit: false,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            adhoc_action_type: DEFAULT_ADHOC_ACTION_TYPE.to_string(),
            permission_hierarchy: Vec::new(),
            groups: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache capacity
    pub fn with_parse_cache_capacity(mut self, capacity: usize) -> Self {
        self.parse_cache_capacity = capacity;
        self
    }

    /// Enable or disable auditing
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    /// Bound the audit log; 0 keeps everything
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Set the permission hierarchy, lowest first
    pub fn with_hierarchy<S: AsRef<str>>(mut self, hierarchy: &[S]) -> Self {
        self.permission_hierarchy = hierarchy.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Add a permission group
    pub fn with_group<S: AsRef<str>>(mut self, name: impl Into<String>, members: &[S]) -> Self {
        self.groups.insert(
            name.into(),
            members.iter().map(|s| s.as_ref().to_string()).collect(),
        );
        self
    }
}
