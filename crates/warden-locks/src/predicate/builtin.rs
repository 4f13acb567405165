//! Built-in predicates
//!
//! Always registered last, so application modules can shadow any of them.
//!
//! | name | passes when |
//! |------|-------------|
//! | `true()`, `all()` | always |
//! | `false()`, `none()` | never |
//! | `id(n)`, `dbref(n)` | accessing id is `n` (`#n` accepted) |
//! | `perm(p)` | accessing holds `p`, or anything above it in the hierarchy |
//! | `perm_above(p)` | accessing holds something strictly above `p` |
//! | `attr(name[, value])` | attribute exists (and equals `value`) |
//! | `attr_eq`, `attr_ne`, `attr_gt`, `attr_ge`, `attr_lt`, `attr_le` | attribute comparison |
//!
//! Attribute predicates read the accessing participant unless given
//! `compare=accessed`.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{PredicateArgs, PredicateContext, PredicateModule};
use crate::error::{Error, Result};
use crate::participant::Participant;

/// Name of the built-in module
pub const MODULE_NAME: &str = "builtin";

/// Build the built-in module
///
/// `hierarchy` lists permission names from lowest to highest and drives
/// `perm` and `perm_above`. Comparison is case-insensitive.
pub fn module<S: AsRef<str>>(hierarchy: &[S]) -> PredicateModule {
    let hierarchy: Arc<Vec<String>> = Arc::new(
        hierarchy
            .iter()
            .map(|level| level.as_ref().trim().to_lowercase())
            .filter(|level| !level.is_empty())
            .collect(),
    );
    let perm_hierarchy = Arc::clone(&hierarchy);
    let above_hierarchy = hierarchy;

    PredicateModule::new(MODULE_NAME)
        .with("true", |_, _| Ok(true))
        .with("all", |_, _| Ok(true))
        .with("false", |_, _| Ok(false))
        .with("none", |_, _| Ok(false))
        .with("id", |ctx, args| id_matches("id", ctx, args))
        .with("dbref", |ctx, args| id_matches("dbref", ctx, args))
        .with("perm", move |ctx, args| perm(ctx, args, &perm_hierarchy))
        .with("perm_above", move |ctx, args| {
            perm_above(ctx, args, &above_hierarchy)
        })
        .with("attr", attr)
        .with("attr_eq", |ctx, args| {
            attr_compare("attr_eq", ctx, args, |o| o == Ordering::Equal)
        })
        .with("attr_ne", |ctx, args| {
            attr_compare("attr_ne", ctx, args, |o| o != Ordering::Equal)
        })
        .with("attr_gt", |ctx, args| {
            attr_compare("attr_gt", ctx, args, |o| o == Ordering::Greater)
        })
        .with("attr_ge", |ctx, args| {
            attr_compare("attr_ge", ctx, args, |o| o != Ordering::Less)
        })
        .with("attr_lt", |ctx, args| {
            attr_compare("attr_lt", ctx, args, |o| o == Ordering::Less)
        })
        .with("attr_le", |ctx, args| {
            attr_compare("attr_le", ctx, args, |o| o != Ordering::Greater)
        })
}

fn id_matches(name: &str, ctx: &PredicateContext<'_>, args: &PredicateArgs) -> Result<bool> {
    let raw = args.require(name, 0)?;
    let wanted: i64 = raw
        .trim_start_matches('#')
        .parse()
        .map_err(|e| Error::invalid_argument(name, format!("cannot parse {:?}: {}", raw, e)))?;
    Ok(ctx.accessing.id() == Some(wanted))
}

fn perm(ctx: &PredicateContext<'_>, args: &PredicateArgs, hierarchy: &[String]) -> Result<bool> {
    let wanted = args.require("perm", 0)?.to_lowercase();
    let held = ctx.keys.iter().any(|key| key.to_lowercase() == wanted);
    if held {
        return Ok(true);
    }

    Ok(match rank(hierarchy, &wanted) {
        Some(level) => highest_rank(ctx, hierarchy).is_some_and(|top| top > level),
        None => false,
    })
}

fn perm_above(
    ctx: &PredicateContext<'_>,
    args: &PredicateArgs,
    hierarchy: &[String],
) -> Result<bool> {
    let wanted = args.require("perm_above", 0)?.to_lowercase();
    let level = rank(hierarchy, &wanted).ok_or_else(|| {
        Error::invalid_argument("perm_above", format!("{:?} is not in the hierarchy", wanted))
    })?;
    Ok(highest_rank(ctx, hierarchy).is_some_and(|top| top > level))
}

fn rank(hierarchy: &[String], permission: &str) -> Option<usize> {
    hierarchy.iter().position(|level| level == permission)
}

fn highest_rank(ctx: &PredicateContext<'_>, hierarchy: &[String]) -> Option<usize> {
    ctx.keys
        .iter()
        .filter_map(|key| rank(hierarchy, &key.to_lowercase()))
        .max()
}

fn attr_source<'a>(ctx: &'a PredicateContext<'_>, args: &PredicateArgs) -> &'a dyn Participant {
    match args.keyword("compare") {
        Some("accessed") => ctx.accessed,
        _ => ctx.accessing,
    }
}

fn attr(ctx: &PredicateContext<'_>, args: &PredicateArgs) -> Result<bool> {
    let name = args.require("attr", 0)?;
    let Some(actual) = attr_source(ctx, args).attribute(name) else {
        return Ok(false);
    };
    Ok(match args.get(1, "value") {
        Some(expected) => compare_values(&actual, expected) == Some(Ordering::Equal),
        None => true,
    })
}

fn attr_compare<F>(
    predicate: &str,
    ctx: &PredicateContext<'_>,
    args: &PredicateArgs,
    accept: F,
) -> Result<bool>
where
    F: Fn(Ordering) -> bool,
{
    let name = args.require(predicate, 0)?;
    let expected = args
        .get(1, "value")
        .ok_or_else(|| Error::invalid_argument(predicate, "missing value to compare with"))?;

    Ok(attr_source(ctx, args)
        .attribute(name)
        .and_then(|actual| compare_values(&actual, expected))
        .is_some_and(accept))
}

/// Numeric comparison when both sides are numbers, lexical otherwise
///
/// `None` when the numbers are unordered (either side is `NaN`), so no
/// comparison predicate passes.
fn compare_values(actual: &str, expected: &str) -> Option<Ordering> {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(actual.cmp(expected)),
    }
}
