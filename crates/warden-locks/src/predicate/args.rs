//! Predicate call arguments

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Positional and keyword arguments of a `name(args)` body-term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateArgs {
    /// Arguments without `=`, in written order
    pub positional: Vec<String>,
    /// `key=value` arguments
    pub keyword: BTreeMap<String, String>,
}

impl PredicateArgs {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text between the parentheses of a call
    ///
    /// Splits on `,`; parts containing `=` become keyword arguments split on
    /// their first `=`. Everything is trimmed and blank parts are skipped.
    pub fn parse(inner: &str) -> Self {
        let mut args = Self::new();
        for part in inner.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((key, value)) => {
                    args.keyword
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                None => args.positional.push(part.to_string()),
            }
        }
        args
    }

    /// Append a positional argument
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn with_keyword(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyword.insert(key.into(), value.into());
        self
    }

    /// Positional argument at `index`
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Keyword argument `name`
    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keyword.get(name).map(String::as_str)
    }

    /// Positional argument at `index`, or keyword `name` as a fallback
    pub fn get(&self, index: usize, name: &str) -> Option<&str> {
        self.positional(index).or_else(|| self.keyword(name))
    }

    /// Positional argument that must be present
    pub fn require(&self, predicate: &str, index: usize) -> Result<&str> {
        self.positional(index).ok_or_else(|| {
            Error::invalid_argument(predicate, format!("missing positional argument {}", index))
        })
    }

    /// Positional argument parsed into `T`
    pub fn parse_at<T>(&self, predicate: &str, index: usize) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require(predicate, index)?;
        raw.parse::<T>().map_err(|e| {
            Error::invalid_argument(predicate, format!("cannot parse {:?}: {}", raw, e))
        })
    }

    /// Total number of arguments
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for PredicateArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .positional
            .iter()
            .cloned()
            .chain(self.keyword.iter().map(|(k, v)| format!("{}={}", k, v)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
