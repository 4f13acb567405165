//! Predicate functions
//!
//! Function-call body-terms such as `id(42)` are resolved against an ordered
//! list of predicate modules. The first module defining the name wins; a name
//! no module defines simply does not pass.

mod args;
pub mod builtin;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::participant::Participant;

pub use args::PredicateArgs;

/// Everything a predicate may inspect
pub struct PredicateContext<'a> {
    /// Participant requesting access
    pub accessing: &'a dyn Participant,
    /// Participant whose locks are evaluated
    pub accessed: &'a dyn Participant,
    /// Accessing keys after linking and group expansion
    pub keys: &'a BTreeSet<String>,
}

/// A registered predicate
pub type PredicateFn =
    Arc<dyn Fn(&PredicateContext<'_>, &PredicateArgs) -> Result<bool> + Send + Sync>;

/// Named collection of predicates
#[derive(Clone)]
pub struct PredicateModule {
    name: String,
    functions: HashMap<String, PredicateFn>,
}

impl PredicateModule {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: HashMap::new(),
        }
    }

    /// Add a predicate, builder style
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&PredicateContext<'_>, &PredicateArgs) -> Result<bool> + Send + Sync + 'static,
    {
        self.insert(name, function);
        self
    }

    /// Add or replace a predicate
    pub fn insert<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&PredicateContext<'_>, &PredicateArgs) -> Result<bool> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a predicate by name
    pub fn get(&self, name: &str) -> Option<&PredicateFn> {
        self.functions.get(name)
    }

    /// Sorted predicate names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of predicates
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the module is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for PredicateModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateModule")
            .field("name", &self.name)
            .field("functions", &self.names())
            .finish()
    }
}

/// Statically submitted predicate module
///
/// Applications can contribute modules without threading them through
/// construction code:
///
/// ```ignore
/// inventory::submit! {
///     PredicateModuleFactory::new("game", 0, game_predicates)
/// }
/// ```
pub struct PredicateModuleFactory {
    /// Factory name, used in logs
    pub name: &'static str,
    /// Lower priorities are consulted first
    pub priority: i32,
    /// Builds the module
    pub build: fn() -> PredicateModule,
}

impl PredicateModuleFactory {
    /// Create a factory
    pub const fn new(name: &'static str, priority: i32, build: fn() -> PredicateModule) -> Self {
        Self {
            name,
            priority,
            build,
        }
    }
}

inventory::collect!(PredicateModuleFactory);

/// Names of all statically submitted factories
pub fn list_discovered_factories() -> Vec<&'static str> {
    inventory::iter::<PredicateModuleFactory>
        .into_iter()
        .map(|factory| factory.name)
        .collect()
}

/// Result of resolving and calling a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateOutcome {
    /// The predicate returned `true`
    Passed,
    /// The predicate returned `false`
    Failed,
    /// No module defines the name
    Missing,
    /// The predicate returned an error
    Errored(String),
    /// The predicate panicked
    Panicked,
}

impl PredicateOutcome {
    /// Only an explicit `true` passes
    pub fn passed(&self) -> bool {
        matches!(self, PredicateOutcome::Passed)
    }
}

/// Ordered predicate modules
#[derive(Clone, Debug, Default)]
pub struct PredicateRegistry {
    modules: Vec<PredicateModule>,
}

static GLOBAL_REGISTRY: Lazy<Arc<PredicateRegistry>> =
    Lazy::new(|| Arc::new(PredicateRegistry::discovered::<&str>(&[])));

impl PredicateRegistry {
    /// Registry with no modules
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in module
    pub fn with_builtins<S: AsRef<str>>(hierarchy: &[S]) -> Self {
        Self::new().with_module(builtin::module(hierarchy))
    }

    /// Registry from every submitted factory, by priority, then the built-ins
    pub fn discovered<S: AsRef<str>>(hierarchy: &[S]) -> Self {
        let mut factories: Vec<&PredicateModuleFactory> =
            inventory::iter::<PredicateModuleFactory>.into_iter().collect();
        factories.sort_by_key(|factory| factory.priority);

        let mut registry = Self::new();
        for factory in factories {
            tracing::debug!(factory = factory.name, "Loading predicate module");
            registry.push_module((factory.build)());
        }
        registry.with_module(builtin::module(hierarchy))
    }

    /// Process-wide registry built once from discovered modules
    pub fn global() -> Arc<PredicateRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Append a module, builder style
    pub fn with_module(mut self, module: PredicateModule) -> Self {
        self.push_module(module);
        self
    }

    /// Append a module; earlier modules take precedence
    pub fn push_module(&mut self, module: PredicateModule) {
        self.modules.push(module);
    }

    /// Put a module in front of all others
    pub fn prepend_module(&mut self, module: PredicateModule) {
        self.modules.insert(0, module);
    }

    /// Module names in lookup order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(PredicateModule::name).collect()
    }

    /// First predicate registered under `name`, with its module name
    pub fn resolve(&self, name: &str) -> Option<(&str, &PredicateFn)> {
        self.modules
            .iter()
            .find_map(|module| module.get(name).map(|function| (module.name(), function)))
    }

    /// Resolve and call a predicate, absorbing errors and panics
    pub fn call(
        &self,
        name: &str,
        context: &PredicateContext<'_>,
        args: &PredicateArgs,
    ) -> PredicateOutcome {
        let Some((_, function)) = self.resolve(name) else {
            return PredicateOutcome::Missing;
        };

        match catch_unwind(AssertUnwindSafe(|| function(context, args))) {
            Ok(Ok(true)) => PredicateOutcome::Passed,
            Ok(Ok(false)) => PredicateOutcome::Failed,
            Ok(Err(e)) => PredicateOutcome::Errored(e.to_string()),
            Err(_) => PredicateOutcome::Panicked,
        }
    }
}
