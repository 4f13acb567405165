//! Lock evaluation for multi-user worlds
//!
//! Every participant carries one permission string mixing plain keys
//! (`Builders`, `can_dig`) with locks (`edit AND: Builders has_id(42)`). The
//! engine answers whether one participant may perform an action on another:
//!
//! ```
//! use warden_locks::{Entity, LockEngine};
//!
//! let engine = LockEngine::new();
//! let bob = Entity::new("bob", "Builders");
//! let door = Entity::new("door", "open: Builders, open: perm(Wizards)");
//! assert!(engine.can_access(&bob, &door, "open", false));
//! ```

pub mod audit;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod groups;
pub mod matcher;
pub mod mutation;
pub mod participant;
pub mod predicate;
pub mod tokenizer;

pub use audit::{AuditLogEntry, AuditLogger, AuditOutcome, AuditQuery, QueryFilter};
pub use cache::{CacheStats, ParseCache};
pub use classifier::{classify, parse, BodyTerm, Flag, FunctionCall, Lock, ParsedPermissions};
pub use config::{ConfigFormat, ConfigLoader, EngineConfig, EnvOverrides, World};
pub use engine::{AccessDecision, LockEngine, LockEngineBuilder};
pub use error::{Error, Result};
pub use groups::{GroupStore, InMemoryGroupStore, NoGroups};
pub use participant::{Entity, Participant};
pub use predicate::{
    PredicateArgs, PredicateContext, PredicateFn, PredicateModule, PredicateModuleFactory,
    PredicateOutcome, PredicateRegistry,
};
pub use tokenizer::tokenize;

// Re-exported for `inventory::submit!` in downstream crates.
pub use inventory;
