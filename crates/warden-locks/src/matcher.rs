//! Lock matching
//!
//! A single lock's body is checked two ways: literal terms against the
//! accessing key set, and function-call terms through the predicate registry.
//! The lock flag decides how the two results combine.

use tracing::{debug, trace, warn};

use crate::classifier::{Flag, Lock};
use crate::predicate::{PredicateContext, PredicateOutcome, PredicateRegistry};

/// Result of one matching strategy over a lock body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchProgress {
    /// The whole lock passes
    Passed,
    /// The whole lock fails
    Failed,
    /// Undecided; carries how many terms passed (used by `AND`)
    Counted(usize),
}

/// Match literal body-terms against the accessing keys
///
/// `OR` passes on the first literal held, `NOT` fails on the first literal
/// held, `AND` counts held literals.
pub fn try_key_lock(lock: &Lock, context: &PredicateContext<'_>) -> MatchProgress {
    let mut held = lock.literals().filter(|literal| context.keys.contains(*literal));

    match lock.flag {
        Flag::Or => match held.next() {
            Some(_) => MatchProgress::Passed,
            None => MatchProgress::Counted(0),
        },
        Flag::Not => match held.next() {
            Some(_) => MatchProgress::Failed,
            None => MatchProgress::Counted(0),
        },
        Flag::And => MatchProgress::Counted(held.count()),
    }
}

/// Match function-call body-terms through the registry
///
/// Unknown, failing and panicking predicates count as not passed.
pub fn try_functional_lock(
    lock: &Lock,
    context: &PredicateContext<'_>,
    registry: &PredicateRegistry,
) -> MatchProgress {
    let mut passed = 0;

    for call in lock.calls() {
        let outcome = registry.call(&call.name, context, &call.args);
        match &outcome {
            PredicateOutcome::Passed | PredicateOutcome::Failed => {
                trace!(predicate = %call, passed = outcome.passed(), "Predicate evaluated");
            }
            PredicateOutcome::Missing => {
                debug!(predicate = %call.name, "No predicate registered under this name");
            }
            PredicateOutcome::Errored(reason) => {
                warn!(predicate = %call, %reason, "Predicate returned an error");
            }
            PredicateOutcome::Panicked => {
                warn!(predicate = %call, "Predicate panicked");
            }
        }

        if outcome.passed() {
            match lock.flag {
                Flag::Or => return MatchProgress::Passed,
                Flag::Not => return MatchProgress::Failed,
                Flag::And => passed += 1,
            }
        }
    }

    MatchProgress::Counted(passed)
}

/// Decide whether a single lock passes
pub fn lock_passes(
    lock: &Lock,
    context: &PredicateContext<'_>,
    registry: &PredicateRegistry,
) -> bool {
    if lock.is_impassable() {
        return lock.flag == Flag::Not;
    }
    if lock.terms.is_empty() {
        return true;
    }

    let direct = match try_key_lock(lock, context) {
        MatchProgress::Passed => return true,
        MatchProgress::Failed => return false,
        MatchProgress::Counted(count) => count,
    };

    let functional = match try_functional_lock(lock, context, registry) {
        MatchProgress::Passed => return true,
        MatchProgress::Failed => return false,
        MatchProgress::Counted(count) => count,
    };

    match lock.flag {
        Flag::And => direct + functional == lock.terms.len(),
        Flag::Or => false,
        Flag::Not => true,
    }
}
