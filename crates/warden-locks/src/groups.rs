//! Permission groups
//!
//! A key naming a known group pulls in that group's members. Expansion is
//! one level deep: members naming other groups are not expanded again.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use tracing::trace;

use crate::classifier::classify;
use crate::error::{Error, Result};

/// Group storage collaborator
pub trait GroupStore: Send + Sync {
    /// Member tokens of the named group, if it exists
    fn lookup_group(&self, name: &str) -> Option<Vec<String>>;
}

/// Store with no groups at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGroups;

impl GroupStore for NoGroups {
    fn lookup_group(&self, _name: &str) -> Option<Vec<String>> {
        None
    }
}

/// Thread-safe in-memory group store
#[derive(Debug, Default)]
pub struct InMemoryGroupStore {
    groups: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryGroupStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with groups
    pub fn from_groups(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            groups: RwLock::new(groups.into_iter().collect()),
        }
    }

    /// Insert or replace a group
    pub fn set_group<S: AsRef<str>>(&self, name: impl Into<String>, members: &[S]) {
        let members = members
            .iter()
            .map(|member| member.as_ref().trim().to_string())
            .filter(|member| !member.is_empty())
            .collect();
        self.groups.write().insert(name.into(), members);
    }

    /// Add one member to an existing group
    pub fn add_member(&self, name: &str, member: &str) -> Result<()> {
        let mut groups = self.groups.write();
        let members = groups
            .get_mut(name)
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))?;
        if !members.iter().any(|existing| existing == member) {
            members.push(member.to_string());
        }
        Ok(())
    }

    /// Remove a group, returning its members
    pub fn remove_group(&self, name: &str) -> Option<Vec<String>> {
        self.groups.write().remove(name)
    }

    /// Names of all known groups, sorted
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    /// Whether the store has no groups
    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl GroupStore for InMemoryGroupStore {
    fn lookup_group(&self, name: &str) -> Option<Vec<String>> {
        self.groups.read().get(name).cloned()
    }
}

/// Expand group keys into their member keys
///
/// Lock entries inside a group are ignored; groups only contribute keys.
pub fn expand<I, S>(keys: I, store: &dyn GroupStore) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut expanded: BTreeSet<String> = keys.into_iter().map(Into::into).collect();

    let mut additions = BTreeSet::new();
    for key in &expanded {
        if let Some(members) = store.lookup_group(key) {
            trace!(group = %key, members = members.len(), "Expanding permission group");
            additions.extend(classify(&members).keys);
        }
    }

    expanded.extend(additions);
    expanded
}
