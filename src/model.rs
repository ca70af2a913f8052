use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::error::{EnvsyncError, Result};

/// Flat key/value set read from a `.env` file or carried in a secret's JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvMapping(BTreeMap<String, String>);

impl EnvMapping {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Upserts every entry of `other` into `self`; `other` wins on conflict.
    pub fn merge_from(&mut self, other: &EnvMapping) -> usize {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
        other.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl FromIterator<(String, String)> for EnvMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EnvMapping {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Body of a remote secret, classified by whether it decodes as a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretContent {
    Structured(EnvMapping),
    Opaque(String),
}

impl SecretContent {
    pub fn decode(blob: &str) -> Self {
        match serde_json::from_str::<EnvMapping>(blob) {
            Ok(mapping) if mapping.keys().all(|key| !key.is_empty()) => Self::Structured(mapping),
            _ => Self::Opaque(blob.to_string()),
        }
    }

    pub fn into_mapping(self, secret_name: &str) -> Result<EnvMapping> {
        match self {
            Self::Structured(mapping) => Ok(mapping),
            Self::Opaque(_) => Err(EnvsyncError::IncompatibleFormat(secret_name.to_string())),
        }
    }
}
