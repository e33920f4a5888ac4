//! Scoped alias substitution for resource paths.
//!
//! Aliases are declared on entities (and at scene level) and referenced from
//! resource paths as `${name}`. A nested entity sees its parent's aliases with
//! its own declarations shadowing them.

use serde::Serialize;
use std::collections::BTreeMap;

/// Why a string could not be substituted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstituteError {
    #[error("alias `{0}` is not declared in scope")]
    Unknown(String),
    #[error("unterminated alias token in `{0}`")]
    Unterminated(String),
}

/// String-to-string substitution table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AliasMap {
    entries: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an alias, returning the previous value for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The mapping visible inside a child scope: `self` overridden by `declared`.
    pub fn scoped(&self, declared: &AliasMap) -> AliasMap {
        let mut entries = self.entries.clone();
        for (k, v) in &declared.entries {
            entries.insert(k.clone(), v.clone());
        }
        AliasMap { entries }
    }

    /// Replace every `${key}` in `input` with its value.
    ///
    /// Values are inserted verbatim; they are not scanned for further tokens.
    pub fn substitute(&self, input: &str) -> Result<String, SubstituteError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| SubstituteError::Unterminated(input.to_string()))?;
            let key = &after[..end];
            let value = self
                .get(key)
                .ok_or_else(|| SubstituteError::Unknown(key.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
