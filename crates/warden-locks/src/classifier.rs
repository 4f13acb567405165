//! Entry classification
//!
//! Separates tokenized permission entries into plain keys and typed locks.
//! A lock is written `<action-types> [FLAG]: <body>`, for example
//! `edit AND: Builders attr_ge(level, 10)`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::predicate::PredicateArgs;
use crate::tokenizer::{split_balanced, tokenize};

/// Body literals that make a lock impassable
pub const IMPASSABLE_LITERALS: [&str; 3] = ["FALSE", "LOCK", "IMPASSABLE"];

/// How the body-terms of a lock combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Flag {
    /// Any term passing passes the lock
    #[default]
    Or,
    /// Every term must pass
    And,
    /// No term may pass
    Not,
}

impl Flag {
    /// Parse a flag token (`AND`/`ALL`, `OR`/`ANY`, `NOT`), case-insensitively
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "AND" | "ALL" => Some(Flag::And),
            "OR" | "ANY" => Some(Flag::Or),
            "NOT" => Some(Flag::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Or => write!(f, "OR"),
            Flag::And => write!(f, "AND"),
            Flag::Not => write!(f, "NOT"),
        }
    }
}

/// A `name(args)` body-term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Predicate name to resolve in the registry
    pub name: String,
    /// Parsed positional and keyword arguments
    pub args: PredicateArgs,
}

impl FunctionCall {
    /// Parse a body-term as a function call
    ///
    /// Returns `None` unless the term has a `(` followed later by a `)` and a
    /// non-empty name before the `(`.
    pub fn parse(term: &str) -> Option<Self> {
        let open = term.find('(')?;
        let close = term.rfind(')')?;
        if open >= close {
            return None;
        }

        let name = term[..open].trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            args: PredicateArgs::parse(&term[open + 1..close]),
        })
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args)
    }
}

/// One atomic unit of a lock body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BodyTerm {
    /// Matched verbatim against the accessing keys
    Literal(String),
    /// Predicate invocation
    Call(FunctionCall),
    /// One of `FALSE`, `LOCK`, `IMPASSABLE`
    Impassable(String),
}

impl BodyTerm {
    /// Classify a single whitespace-delimited body-term
    pub fn parse(term: &str) -> Self {
        if IMPASSABLE_LITERALS.contains(&term) {
            return BodyTerm::Impassable(term.to_string());
        }
        match FunctionCall::parse(term) {
            Some(call) => BodyTerm::Call(call),
            None => BodyTerm::Literal(unescape(term)),
        }
    }
}

impl fmt::Display for BodyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyTerm::Literal(text) | BodyTerm::Impassable(text) => write!(f, "{}", text),
            BodyTerm::Call(call) => write!(f, "{}", call),
        }
    }
}

/// A typed access rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Combination flag
    pub flag: Flag,
    /// Lower-cased action-types this lock guards
    pub action_types: BTreeSet<String>,
    /// Body-terms in written order
    pub terms: Vec<BodyTerm>,
}

impl Lock {
    /// Whether this lock guards `action_type` (case-insensitive)
    pub fn applies_to(&self, action_type: &str) -> bool {
        self.action_types.contains(&action_type.to_lowercase())
    }

    /// Whether any body-term is an impassable literal
    pub fn is_impassable(&self) -> bool {
        self.terms
            .iter()
            .any(|term| matches!(term, BodyTerm::Impassable(_)))
    }

    /// Literal body-terms
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|term| match term {
            BodyTerm::Literal(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Function-call body-terms
    pub fn calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.terms.iter().filter_map(|term| match term {
            BodyTerm::Call(call) => Some(call),
            _ => None,
        })
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<&str> = self.action_types.iter().map(String::as_str).collect();
        write!(f, "{}", types.join(" "))?;
        if self.flag != Flag::Or {
            write!(f, " {}", self.flag)?;
        }
        write!(f, ":")?;
        for term in &self.terms {
            write!(f, " {}", term)?;
        }
        Ok(())
    }
}

/// Keys and locks of one permission string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPermissions {
    /// Plain capability tokens
    pub keys: BTreeSet<String>,
    /// Locks in written order
    pub locks: Vec<Lock>,
}

impl ParsedPermissions {
    /// Locks guarding `action_type`
    pub fn locks_for<'a>(&'a self, action_type: &str) -> impl Iterator<Item = &'a Lock> + 'a {
        let action_type = action_type.to_lowercase();
        self.locks
            .iter()
            .filter(move |lock| lock.action_types.contains(&action_type))
    }

    /// Whether any lock guards `action_type`
    pub fn has_locks_for(&self, action_type: &str) -> bool {
        self.locks_for(action_type).next().is_some()
    }
}

/// Tokenize and classify a raw permission string
pub fn parse(raw: &str) -> ParsedPermissions {
    classify(&tokenize(raw))
}

/// Classify tokenized entries into keys and locks
pub fn classify<S: AsRef<str>>(entries: &[S]) -> ParsedPermissions {
    let mut parsed = ParsedPermissions::default();

    for entry in entries {
        let entry = entry.as_ref().trim();
        if entry.is_empty() {
            continue;
        }

        match find_unescaped_colon(entry) {
            Some(split) => parsed
                .locks
                .push(parse_lock(&entry[..split], &entry[split + 1..])),
            None => {
                parsed.keys.insert(unescape(entry));
            }
        }
    }

    parsed
}

fn parse_lock(header: &str, body: &str) -> Lock {
    let mut header_tokens: Vec<&str> = header.split_whitespace().collect();
    // A lone header token is always an action-type, even if it spells a flag.
    let flag_token = match header_tokens.as_slice() {
        [_, .., last] => Flag::parse(last),
        _ => None,
    };
    let flag = match flag_token {
        Some(flag) => {
            header_tokens.pop();
            flag
        }
        None => Flag::Or,
    };

    let action_types = header_tokens
        .into_iter()
        .map(|token| unescape(token).to_lowercase())
        .collect();

    let terms = split_balanced(body.split_whitespace(), " ")
        .iter()
        .map(|term| BodyTerm::parse(term))
        .collect();

    Lock {
        flag,
        action_types,
        terms,
    }
}

/// Byte offset of the first `:` not preceded by a backslash
fn find_unescaped_colon(entry: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in entry.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => return Some(idx),
            _ => escaped = false,
        }
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("\\:", ":")
}

/// Group lock bodies by action-type, for display and inspection
pub fn locks_by_action_type(parsed: &ParsedPermissions) -> BTreeMap<String, Vec<&Lock>> {
    let mut grouped: BTreeMap<String, Vec<&Lock>> = BTreeMap::new();
    for lock in &parsed.locks {
        for action_type in &lock.action_types {
            grouped.entry(action_type.clone()).or_default().push(lock);
        }
    }
    grouped
}
