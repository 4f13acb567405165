//! Access decision engine
//!
//! Answers "may `accessing` perform `action_type` on `accessed`?". The checks
//! run in this order:
//!
//! 1. A superuser (or a participant linked to one) is always granted.
//! 2. Locks on `accessed` guarding `action_type` are selected. With none,
//!    the per-call default policy decides (permissive unless asked to deny).
//! 3. The accessing keys (own, linked, group-expanded) are built.
//! 4. Locks are tried in written order. An impassable lock decides the whole
//!    check on its own; otherwise the first passing lock grants access.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::audit::AuditLogger;
use crate::cache::{CacheStats, ParseCache};
use crate::classifier::{Flag, ParsedPermissions};
use crate::config::{EngineConfig, DEFAULT_ADHOC_ACTION_TYPE, DEFAULT_PARSE_CACHE_CAPACITY};
use crate::groups::{self, GroupStore, InMemoryGroupStore, NoGroups};
use crate::matcher::lock_passes;
use crate::participant::Participant;
use crate::predicate::{PredicateContext, PredicateRegistry};

/// Why access was granted or refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Accessing side (or its linked participant) is a superuser
    Superuser,
    /// No lock guards the action-type; the default policy applied
    DefaultPolicy { granted: bool },
    /// An impassable lock decided; only `NOT` locks grant
    Impassable { granted: bool, lock: usize },
    /// The lock at this position passed
    LockPassed { lock: usize },
    /// Every relevant lock failed
    NoLockPassed { checked: usize },
}

impl AccessDecision {
    /// Whether access is granted
    pub fn is_granted(&self) -> bool {
        match self {
            AccessDecision::Superuser | AccessDecision::LockPassed { .. } => true,
            AccessDecision::DefaultPolicy { granted } | AccessDecision::Impassable { granted, .. } => {
                *granted
            }
            AccessDecision::NoLockPassed { .. } => false,
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::Superuser => write!(f, "superuser"),
            AccessDecision::DefaultPolicy { granted: true } => write!(f, "no lock, default allow"),
            AccessDecision::DefaultPolicy { granted: false } => write!(f, "no lock, default deny"),
            AccessDecision::Impassable { granted, lock } => {
                let verb = if *granted { "negated" } else { "blocks" };
                write!(f, "impassable lock {} {}", lock, verb)
            }
            AccessDecision::LockPassed { lock } => write!(f, "lock {} passed", lock),
            AccessDecision::NoLockPassed { checked } => {
                write!(f, "none of {} locks passed", checked)
            }
        }
    }
}

/// Evaluates permission strings against participants
///
/// Cheap to share across threads; all state is read-only apart from the
/// parse cache and the optional audit log.
pub struct LockEngine {
    registry: Arc<PredicateRegistry>,
    groups: Arc<dyn GroupStore>,
    cache: ParseCache,
    audit: Option<AuditLogger>,
    adhoc_action_type: String,
}

impl LockEngine {
    /// Engine with the process-wide registry, no groups and default caching
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building an engine
    pub fn builder() -> LockEngineBuilder {
        LockEngineBuilder::default()
    }

    /// Engine configured from an [`EngineConfig`]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    /// Whether `accessing` may perform `action_type` on `accessed`
    pub fn can_access(
        &self,
        accessing: &dyn Participant,
        accessed: &dyn Participant,
        action_type: &str,
        default_deny: bool,
    ) -> bool {
        self.check(accessing, accessed, action_type, default_deny)
            .is_granted()
    }

    /// Check `accessing` against an ad-hoc list of lock bodies
    ///
    /// Each item is a lock body such as `"Builders perm(Wizards)"`, optionally
    /// prefixed by a flag header (`"NOT: Banned"`). The items are evaluated as
    /// if they were locks of one synthetic participant.
    pub fn can_access_string<S: AsRef<str>>(
        &self,
        accessing: &dyn Participant,
        lock_list: &[S],
        default_deny: bool,
    ) -> bool {
        let synthetic = LockList::new(&self.adhoc_action_type, lock_list);
        self.check(accessing, &synthetic, &self.adhoc_action_type, default_deny)
            .is_granted()
    }

    /// Decide and explain an access check
    pub fn check(
        &self,
        accessing: &dyn Participant,
        accessed: &dyn Participant,
        action_type: &str,
        default_deny: bool,
    ) -> AccessDecision {
        let decision = self.decide(accessing, accessed, action_type, default_deny);

        debug!(
            action_type,
            accessing = %accessing.label(),
            accessed = %accessed.label(),
            granted = decision.is_granted(),
            %decision,
            "Access decided"
        );

        if let Some(audit) = &self.audit {
            audit.record(
                action_type,
                &accessing.label(),
                &accessed.label(),
                decision.is_granted(),
                &decision.to_string(),
            );
        }

        decision
    }

    fn decide(
        &self,
        accessing: &dyn Participant,
        accessed: &dyn Participant,
        action_type: &str,
        default_deny: bool,
    ) -> AccessDecision {
        if is_superuser(accessing) {
            return AccessDecision::Superuser;
        }

        let parsed = self.parse(&accessed.permission_string());
        let relevant: Vec<_> = parsed
            .locks
            .iter()
            .enumerate()
            .filter(|(_, lock)| lock.applies_to(action_type))
            .collect();

        if relevant.is_empty() {
            return AccessDecision::DefaultPolicy {
                granted: !default_deny,
            };
        }

        let keys = self.keys_of(accessing);
        let context = PredicateContext {
            accessing,
            accessed,
            keys: &keys,
        };

        for (index, lock) in &relevant {
            if lock.is_impassable() {
                return AccessDecision::Impassable {
                    granted: lock.flag == Flag::Not,
                    lock: *index,
                };
            }
            if lock_passes(lock, &context, &self.registry) {
                return AccessDecision::LockPassed { lock: *index };
            }
            trace!(lock = %lock, "Lock did not pass");
        }

        AccessDecision::NoLockPassed {
            checked: relevant.len(),
        }
    }

    /// Keys of `accessing`, its linked participant, and their groups
    pub fn keys_of(&self, accessing: &dyn Participant) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.parse(&accessing.permission_string()).keys.clone();
        if let Some(linked) = accessing.linked() {
            keys.extend(self.parse(&linked.permission_string()).keys.iter().cloned());
        }
        groups::expand(keys, self.groups.as_ref())
    }

    /// Parse a permission string through the cache
    pub fn parse(&self, raw: &str) -> Arc<ParsedPermissions> {
        self.cache.get_or_parse(raw)
    }

    /// Predicate registry in use
    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Group store in use
    pub fn groups(&self) -> &dyn GroupStore {
        self.groups.as_ref()
    }

    /// Parse cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Audit log, when auditing is enabled
    pub fn audit_log(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Action-type used by [`LockEngine::can_access_string`]
    pub fn adhoc_action_type(&self) -> &str {
        &self.adhoc_action_type
    }
}

impl Default for LockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LockEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockEngine")
            .field("registry", &self.registry.module_names())
            .field("cache", &self.cache)
            .field("audit", &self.audit.is_some())
            .field("adhoc_action_type", &self.adhoc_action_type)
            .finish()
    }
}

fn is_superuser(participant: &dyn Participant) -> bool {
    participant.is_superuser()
        || participant
            .linked()
            .is_some_and(|linked| linked.is_superuser())
}

/// Builder for [`LockEngine`]
pub struct LockEngineBuilder {
    registry: Option<Arc<PredicateRegistry>>,
    groups: Option<Arc<dyn GroupStore>>,
    config_groups: BTreeMap<String, Vec<String>>,
    hierarchy: Vec<String>,
    cache_capacity: usize,
    audit: Option<AuditLogger>,
    adhoc_action_type: String,
}

impl Default for LockEngineBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            groups: None,
            config_groups: BTreeMap::new(),
            hierarchy: Vec::new(),
            cache_capacity: DEFAULT_PARSE_CACHE_CAPACITY,
            audit: None,
            adhoc_action_type: DEFAULT_ADHOC_ACTION_TYPE.to_string(),
        }
    }
}

impl LockEngineBuilder {
    /// Apply every setting of `config`
    ///
    /// Groups from the config are used unless a group store is set explicitly.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.cache_capacity = config.parse_cache_capacity;
        self.adhoc_action_type = config.adhoc_action_type.clone();
        self.hierarchy = config.permission_hierarchy.clone();
        self.config_groups = config.groups.clone();
        if config.audit && self.audit.is_none() {
            self.audit = Some(AuditLogger::with_capacity(config.audit_capacity));
        }
        self
    }

    /// Use an explicit predicate registry
    pub fn with_registry(mut self, registry: impl Into<Arc<PredicateRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Use an explicit group store
    pub fn with_groups(mut self, groups: Arc<dyn GroupStore>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Set the parse cache capacity; 0 disables it
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Record decisions in `logger`
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Action-type for ad-hoc lock lists
    pub fn with_adhoc_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.adhoc_action_type = action_type.into();
        self
    }

    /// Build the engine
    pub fn build(self) -> LockEngine {
        let registry = match self.registry {
            Some(registry) => registry,
            None if self.hierarchy.is_empty() => PredicateRegistry::global(),
            None => Arc::new(PredicateRegistry::discovered(&self.hierarchy)),
        };

        let groups: Arc<dyn GroupStore> = match self.groups {
            Some(groups) => groups,
            None if self.config_groups.is_empty() => Arc::new(NoGroups),
            None => Arc::new(InMemoryGroupStore::from_groups(self.config_groups)),
        };

        LockEngine {
            registry,
            groups,
            cache: ParseCache::new(self.cache_capacity),
            audit: self.audit,
            adhoc_action_type: self.adhoc_action_type.to_lowercase(),
        }
    }
}

/// Synthetic participant carrying an ad-hoc lock list
struct LockList {
    permissions: String,
}

impl LockList {
    fn new<S: AsRef<str>>(action_type: &str, bodies: &[S]) -> Self {
        let entries: Vec<String> = bodies
            .iter()
            .map(|body| {
                let body = body.as_ref().trim();
                match body.split_once(':') {
                    Some((header, rest)) if is_flag_header(header) => {
                        format!("{} {}: {}", action_type, header.trim(), rest.trim())
                    }
                    _ => format!("{}: {}", action_type, body),
                }
            })
            .collect();
        Self {
            permissions: entries.join(","),
        }
    }
}

fn is_flag_header(header: &str) -> bool {
    let header = header.trim();
    header.is_empty() || Flag::parse(header).is_some()
}

impl Participant for LockList {
    fn permission_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.permissions)
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("<lock list>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Entity;
    use crate::predicate::PredicateModule;

    fn engine() -> LockEngine {
        let groups = InMemoryGroupStore::new();
        groups.set_group("Builders", &["can_dig", "can_set_desc"]);
        LockEngine::builder()
            .with_registry(PredicateRegistry::with_builtins(&["Players", "Builders", "Wizards"]))
            .with_groups(Arc::new(groups))
            .build()
    }

    #[test]
    fn test_superuser_bypasses_impassable() {
        let engine = engine();
        let root = Entity::new("root", "").with_superuser(true);
        let vault = Entity::new("vault", "open: FALSE");
        assert_eq!(
            engine.check(&root, &vault, "open", true),
            AccessDecision::Superuser
        );
    }

    #[test]
    fn test_linked_superuser() {
        let engine = engine();
        let account = Entity::new("acct", "").with_superuser(true);
        let character = Entity::new("char", "").with_linked(account);
        let vault = Entity::new("vault", "open: FALSE");
        assert!(engine.can_access(&character, &vault, "open", false));
    }

    #[test]
    fn test_default_policy() {
        let engine = engine();
        let bob = Entity::new("bob", "");
        let rock = Entity::new("rock", "get: can_lift");
        assert!(engine.can_access(&bob, &rock, "look", false));
        assert!(!engine.can_access(&bob, &rock, "look", true));
        assert_eq!(
            engine.check(&bob, &rock, "look", true),
            AccessDecision::DefaultPolicy { granted: false }
        );
    }

    #[test]
    fn test_action_type_is_case_insensitive() {
        let engine = engine();
        let bob = Entity::new("bob", "can_lift");
        let rock = Entity::new("rock", "GET: can_lift");
        assert!(engine.can_access(&bob, &rock, "Get", true));
    }

    #[test]
    fn test_group_expansion() {
        let engine = engine();
        let bob = Entity::new("bob", "Builders");
        let ground = Entity::new("ground", "dig: can_dig");
        assert!(engine.can_access(&bob, &ground, "dig", false));
    }

    #[test]
    fn test_linked_keys_are_folded_in() {
        let engine = engine();
        let account = Entity::new("acct", "can_dig");
        let character = Entity::new("char", "").with_linked(account);
        let ground = Entity::new("ground", "dig: can_dig");
        assert!(engine.can_access(&character, &ground, "dig", false));
    }

    #[test]
    fn test_impassable_is_decisive() {
        let engine = engine();
        let bob = Entity::new("bob", "A");
        let wall = Entity::new("wall", "pass: A, pass: FALSE");
        assert_eq!(
            engine.check(&bob, &wall, "pass", false),
            AccessDecision::LockPassed { lock: 0 }
        );

        let wall = Entity::new("wall", "pass: FALSE, pass: A");
        assert_eq!(
            engine.check(&bob, &wall, "pass", false),
            AccessDecision::Impassable {
                granted: false,
                lock: 0
            }
        );

        let gate = Entity::new("gate", "pass NOT: LOCK");
        assert!(engine.can_access(&bob, &gate, "pass", false));
    }

    #[test]
    fn test_escaped_colon_matches_on_both_sides() {
        let engine = engine();
        let scout = Entity::new("scout", r"realm\:north");
        let gate = Entity::new("gate", r"enter: realm\:north");
        assert!(engine.can_access(&scout, &gate, "enter", false));

        let stranger = Entity::new("stranger", "realm");
        assert!(!engine.can_access(&stranger, &gate, "enter", false));
    }

    #[test]
    fn test_flag_word_as_only_action_type() {
        let engine = engine();
        let bob = Entity::new("bob", "A");
        let wall = Entity::new("wall", "all: FALSE");
        assert_eq!(
            engine.check(&bob, &wall, "all", false),
            AccessDecision::Impassable {
                granted: false,
                lock: 0
            }
        );
        assert!(engine.can_access(&bob, &wall, "look", false));
    }

    #[test]
    fn test_locks_are_ored() {
        let engine = engine();
        let bob = Entity::new("bob", "Builders");
        let desk = Entity::new("desk", "edit: can_nothing, edit: Builders");
        assert_eq!(
            engine.check(&bob, &desk, "edit", false),
            AccessDecision::LockPassed { lock: 1 }
        );
    }

    #[test]
    fn test_no_lock_passed() {
        let engine = engine();
        let bob = Entity::new("bob", "");
        let desk = Entity::new("desk", "edit: A, get: B, edit AND: C D");
        assert_eq!(
            engine.check(&bob, &desk, "edit", false),
            AccessDecision::NoLockPassed { checked: 2 }
        );
    }

    #[test]
    fn test_builtin_predicates_through_engine() {
        let engine = engine();
        let wizard = Entity::new("w", "Wizards").with_id(1);
        let door = Entity::new("door", "open: perm(Builders), control: id(1)");
        assert!(engine.can_access(&wizard, &door, "open", false));
        assert!(engine.can_access(&wizard, &door, "control", false));

        let player = Entity::new("p", "Players").with_id(2);
        assert!(!engine.can_access(&player, &door, "open", false));
        assert!(!engine.can_access(&player, &door, "control", false));
    }

    #[test]
    fn test_nan_attribute_does_not_grant() {
        let engine = engine();
        let odd = Entity::new("odd", "").with_attribute("level", "NaN");
        let door = Entity::new(
            "door",
            "open: attr_eq(level, 5), enter AND: attr_ge(level, 10) attr_le(level, 1)",
        );
        assert!(!engine.can_access(&odd, &door, "open", false));
        assert!(!engine.can_access(&odd, &door, "enter", false));
    }

    #[test]
    fn test_can_access_string() {
        let engine = engine();
        let bob = Entity::new("bob", "Builders");
        assert!(engine.can_access_string(&bob, &["can_dig"], false));
        assert!(engine.can_access_string(&bob, &["nothing", "perm(Builders)"], false));
        assert!(!engine.can_access_string(&bob, &["NOT: Builders"], false));
        assert!(engine.can_access_string(&bob, &["AND: can_dig can_set_desc"], false));
        assert!(!engine.can_access_string(&bob, &["FALSE"], false));
    }

    #[test]
    fn test_can_access_string_empty_list_uses_default() {
        let engine = engine();
        let bob = Entity::new("bob", "");
        let empty: [&str; 0] = [];
        assert!(engine.can_access_string(&bob, &empty, false));
        assert!(!engine.can_access_string(&bob, &empty, true));
    }

    #[test]
    fn test_lock_list_keeps_colons_inside_bodies() {
        let list = LockList::new("adhoc", &["attr(a:b)", "NOT: x", ": y"]);
        assert_eq!(
            list.permissions,
            "adhoc: attr(a:b),adhoc NOT: x,adhoc : y"
        );
    }

    #[test]
    fn test_predicate_receives_both_participants() {
        let registry = PredicateRegistry::new().with_module(
            PredicateModule::new("game").with("same_owner", |ctx, _| {
                Ok(ctx.accessing.attribute("owner") == ctx.accessed.attribute("owner"))
            }),
        );
        let engine = LockEngine::builder().with_registry(registry).build();
        let bob = Entity::new("bob", "").with_attribute("owner", "bob");
        let chest = Entity::new("chest", "open: same_owner()").with_attribute("owner", "bob");
        let eve = Entity::new("eve", "").with_attribute("owner", "eve");
        assert!(engine.can_access(&bob, &chest, "open", false));
        assert!(!engine.can_access(&eve, &chest, "open", false));
    }

    #[test]
    fn test_audit_records_decisions() {
        let logger = AuditLogger::new();
        let engine = LockEngine::builder().with_audit(logger.clone()).build();
        let bob = Entity::new("bob", "");
        let rock = Entity::new("rock", "get: FALSE");
        engine.can_access(&bob, &rock, "get", false);

        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].accessing, "bob");
        assert_eq!(entries[0].accessed, "rock");
        assert!(entries[0].reason.contains("impassable"));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig::new()
            .with_group("Builders", &["can_dig"])
            .with_hierarchy(&["Players", "Wizards"])
            .with_audit(true)
            .with_audit_capacity(1)
            .with_parse_cache_capacity(0);
        let engine = LockEngine::from_config(&config);
        let audit = engine.audit_log().expect("audit enabled");
        assert_eq!(audit.capacity(), Some(1));
        assert!(engine.groups().lookup_group("Builders").is_some());

        let wizard = Entity::new("w", "Wizards");
        let door = Entity::new("door", "open: perm(Players)");
        assert!(engine.can_access(&wizard, &door, "open", false));
        assert!(engine.can_access(&wizard, &door, "look", false));
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.entries()[0].action_type, "look");
        assert_eq!(engine.cache_stats(), CacheStats::default());
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(AccessDecision::Superuser.to_string(), "superuser");
        assert_eq!(
            AccessDecision::NoLockPassed { checked: 2 }.to_string(),
            "none of 2 locks passed"
        );
        assert_eq!(
            AccessDecision::Impassable {
                granted: true,
                lock: 0
            }
            .to_string(),
            "impassable lock 0 negated"
        );
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LockEngine>();
    }
}
