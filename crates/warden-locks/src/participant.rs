//! Participants in an access check
//!
//! Anything that carries a permission string can take part in a check, either
//! as the accessing side or as the accessed side.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mutation;

/// Entity shape required by the lock engine
pub trait Participant {
    /// Raw permission string (comma separated keys and locks)
    fn permission_string(&self) -> Cow<'_, str>;

    /// Superusers pass every check
    fn is_superuser(&self) -> bool {
        false
    }

    /// Linked secondary participant, such as a controlling account
    fn linked(&self) -> Option<&dyn Participant> {
        None
    }

    /// Numeric identity used by `id()` predicates
    fn id(&self) -> Option<i64> {
        None
    }

    /// Display label for logs and audit entries
    fn label(&self) -> Cow<'_, str> {
        match self.id() {
            Some(id) => Cow::Owned(format!("#{}", id)),
            None => Cow::Borrowed("<anonymous>"),
        }
    }

    /// Named attribute value used by `attr*()` predicates
    fn attribute(&self, _name: &str) -> Option<String> {
        None
    }
}

impl<T: Participant + ?Sized> Participant for &T {
    fn permission_string(&self) -> Cow<'_, str> {
        (**self).permission_string()
    }

    fn is_superuser(&self) -> bool {
        (**self).is_superuser()
    }

    fn linked(&self) -> Option<&dyn Participant> {
        (**self).linked()
    }

    fn id(&self) -> Option<i64> {
        (**self).id()
    }

    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }
}

/// Plain in-memory participant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Optional numeric identity
    #[serde(default)]
    pub id: Option<i64>,
    /// Human readable name
    #[serde(default)]
    pub name: String,
    /// Raw permission string
    #[serde(default)]
    pub permissions: String,
    /// Superuser flag
    #[serde(default)]
    pub superuser: bool,
    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Linked secondary participant
    #[serde(default)]
    pub linked: Option<Box<Entity>>,
}

impl Entity {
    /// Create a named entity with the given permission string
    pub fn new(name: impl Into<String>, permissions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into(),
            ..Self::default()
        }
    }

    /// Set the numeric identity
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Mark as superuser
    pub fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Link a secondary participant
    pub fn with_linked(mut self, linked: Entity) -> Self {
        self.linked = Some(Box::new(linked));
        self
    }

    /// Add a permission entry, ignoring duplicates
    pub fn add_permission(&mut self, entry: &str) {
        self.permissions = mutation::add(&self.permissions, entry);
    }

    /// Remove a permission entry
    pub fn remove_permission(&mut self, entry: &str) -> bool {
        let before = self.permissions.clone();
        self.permissions = mutation::remove(&self.permissions, entry);
        mutation::normalize(&before) != self.permissions
    }

    /// Replace all permissions with the given entries
    pub fn set_permissions<S: AsRef<str>>(&mut self, entries: &[S]) {
        self.permissions = mutation::from_entries(entries);
    }
}

impl Participant for Entity {
    fn permission_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.permissions)
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn linked(&self) -> Option<&dyn Participant> {
        self.linked.as_deref().map(|entity| entity as &dyn Participant)
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> Cow<'_, str> {
        match (self.name.is_empty(), self.id) {
            (false, Some(id)) => Cow::Owned(format!("{}(#{})", self.name, id)),
            (false, None) => Cow::Borrowed(&self.name),
            (true, Some(id)) => Cow::Owned(format!("#{}", id)),
            (true, None) => Cow::Borrowed("<anonymous>"),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}
