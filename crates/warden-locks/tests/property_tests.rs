//! Property-based tests for warden-locks
//!
//! These tests check behaviour that must hold for any permission string.

use proptest::prelude::*;
use warden_locks::{mutation, tokenize, AccessDecision, Entity, LockEngine};

const RESERVED: [&str; 5] = ["and", "all", "or", "any", "not"];

fn key_strategy() -> impl Strategy<Value = String> {
    r"[a-z][a-z0-9_]{0,8}".prop_map(|s| s.to_string())
}

fn action_strategy() -> impl Strategy<Value = String> {
    r"[a-z]{1,8}"
        .prop_filter("flag words are not action-types", |s| {
            !RESERVED.contains(&s.as_str())
        })
        .prop_map(|s| s.to_string())
}

/// Arbitrary text over the characters the tokenizer cares about
fn raw_strategy() -> impl Strategy<Value = String> {
    r"[a-zA-Z0-9_ ,:()]{0,40}".prop_map(|s| s.to_string())
}

fn engine(cache_capacity: usize) -> LockEngine {
    LockEngine::builder()
        .with_cache_capacity(cache_capacity)
        .build()
}

// ============================================================================
// Tokenizer
// ============================================================================

proptest! {
    #[test]
    fn prop_tokenize_is_idempotent(raw in raw_strategy()) {
        let tokens = tokenize(&raw);
        prop_assert_eq!(tokenize(&tokens.join(",")), tokens);
    }

    #[test]
    fn prop_tokens_are_trimmed_and_non_empty(raw in raw_strategy()) {
        for token in tokenize(&raw) {
            prop_assert!(!token.is_empty());
            prop_assert_eq!(token.trim(), token.as_str());
        }
    }

    #[test]
    fn prop_commas_inside_parentheses_survive(
        name in key_strategy(),
        first in key_strategy(),
        second in key_strategy(),
    ) {
        let call = format!("{}({}, {})", name, first, second);
        let raw = format!("head, t: {}, tail", call);
        let tokens = tokenize(&raw);
        prop_assert_eq!(tokens.len(), 3);
        prop_assert_eq!(&tokens[1], &format!("t: {}", call));
    }

    #[test]
    fn prop_normalize_is_stable(raw in raw_strategy()) {
        let once = mutation::normalize(&raw);
        prop_assert_eq!(mutation::normalize(&once), once);
    }
}

// ============================================================================
// Access decisions
// ============================================================================

proptest! {
    #[test]
    fn prop_superuser_is_always_granted(
        accessed in raw_strategy(),
        action in action_strategy(),
        default_deny in any::<bool>(),
    ) {
        let root = Entity::new("root", "").with_superuser(true);
        let target = Entity::new("target", accessed);
        prop_assert_eq!(
            engine(16).check(&root, &target, &action, default_deny),
            AccessDecision::Superuser
        );
    }

    #[test]
    fn prop_unregulated_action_follows_default(
        keys in prop::collection::vec(key_strategy(), 0..5),
        action in action_strategy(),
        default_deny in any::<bool>(),
    ) {
        let bob = Entity::new("bob", keys.join(", "));
        let target = Entity::new("target", format!("x{}: nobody", action));
        prop_assert_eq!(
            engine(16).can_access(&bob, &target, &action, default_deny),
            !default_deny
        );
    }

    #[test]
    fn prop_or_lock_grants_any_held_key(
        keys in prop::collection::vec(key_strategy(), 1..5),
        pick in any::<prop::sample::Index>(),
        action in action_strategy(),
    ) {
        let held = pick.get(&keys).clone();
        let bob = Entity::new("bob", held);
        let target = Entity::new("target", format!("{}: {}", action, keys.join(" ")));
        prop_assert!(engine(16).can_access(&bob, &target, &action, true));
    }

    #[test]
    fn prop_and_lock_needs_every_key(
        keys in prop::collection::btree_set(key_strategy(), 2..5),
        action in action_strategy(),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let target = Entity::new("target", format!("{} AND: {}", action, keys.join(" ")));

        let full = Entity::new("full", keys.join(", "));
        prop_assert!(engine(16).can_access(&full, &target, &action, false));

        let partial = Entity::new("partial", keys[1..].join(", "));
        prop_assert!(!engine(16).can_access(&partial, &target, &action, false));
    }

    #[test]
    fn prop_not_lock_refuses_held_keys(
        keys in prop::collection::btree_set(key_strategy(), 1..5),
        stranger in key_strategy(),
        action in action_strategy(),
    ) {
        let body: Vec<String> = keys.iter().cloned().collect();
        let target = Entity::new("target", format!("{} NOT: {}", action, body.join(" ")));

        let insider = Entity::new("insider", body[0].clone());
        prop_assert!(!engine(16).can_access(&insider, &target, &action, false));

        let outsider = Entity::new("outsider", format!("{}-x", stranger));
        prop_assert!(engine(16).can_access(&outsider, &target, &action, false));
    }

    #[test]
    fn prop_impassable_refuses_everyone_but_superusers(
        keys in prop::collection::vec(key_strategy(), 0..5),
        literal in prop::sample::select(vec!["FALSE", "LOCK", "IMPASSABLE"]),
        action in action_strategy(),
    ) {
        let bob = Entity::new("bob", keys.join(", "));
        let target = Entity::new(
            "target",
            format!("{}: {} {}", action, keys.join(" "), literal),
        );
        prop_assert!(!engine(16).can_access(&bob, &target, &action, false));

        let negated = Entity::new("gate", format!("{} NOT: {}", action, literal));
        prop_assert!(engine(16).can_access(&bob, &negated, &action, true));
    }

    #[test]
    fn prop_cache_does_not_change_decisions(
        accessing in raw_strategy(),
        accessed in raw_strategy(),
        action in action_strategy(),
        default_deny in any::<bool>(),
    ) {
        let cached = engine(8);
        let uncached = engine(0);
        let bob = Entity::new("bob", accessing);
        let target = Entity::new("target", accessed);

        let expected = uncached.check(&bob, &target, &action, default_deny);
        prop_assert_eq!(cached.check(&bob, &target, &action, default_deny), expected);
        prop_assert_eq!(cached.check(&bob, &target, &action, default_deny), expected);
    }
}
