//! Flat key-value preferences store.
//!
//! Commands, contacts, history and default parameter values are all kept as
//! typed values under string keys. Every save rewrites whole collections;
//! there are no partial updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::error::Result;

/// A typed preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SettingValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Bool(bool),
}

impl SettingValue {
    /// Name of the value type, as written in backup files.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::String(_) => "String",
            SettingValue::Int(_) => "Integer",
            SettingValue::Long(_) => "Long",
            SettingValue::Float(_) => "Float",
            SettingValue::Bool(_) => "Boolean",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::String(v) => write!(f, "{}", v),
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Long(v) => write!(f, "{}", v),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Storage the session reads preferences from and flushes them to.
///
/// Typed getters fall back to `default` when the key is missing or holds a
/// value of another type.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<SettingValue>>;

    fn put(&mut self, key: &str, value: SettingValue) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// All entries, ordered by key.
    fn entries(&self) -> Result<Vec<(String, SettingValue)>>;

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|(k, _)| k).collect())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_string(&self, key: &str, default: &str) -> Result<String> {
        Ok(match self.get(key)? {
            Some(SettingValue::String(v)) => v,
            _ => default.to_string(),
        })
    }

    fn get_int(&self, key: &str, default: i32) -> Result<i32> {
        Ok(match self.get(key)? {
            Some(SettingValue::Int(v)) => v,
            _ => default,
        })
    }

    fn get_long(&self, key: &str, default: i64) -> Result<i64> {
        Ok(match self.get(key)? {
            Some(SettingValue::Long(v)) => v,
            _ => default,
        })
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(match self.get(key)? {
            Some(SettingValue::Bool(v)) => v,
            _ => default,
        })
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, SettingValue::String(value.to_string()))
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<()> {
        self.put(key, SettingValue::Int(value))
    }

    fn put_long(&mut self, key: &str, value: i64) -> Result<()> {
        self.put(key, SettingValue::Long(value))
    }

    fn put_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.put(key, SettingValue::Bool(value))
    }

    /// Remove every key starting with `prefix`.
    fn remove_prefixed(&mut self, prefix: &str) -> Result<()> {
        for key in self.keys()? {
            if key.starts_with(prefix) {
                self.remove(&key)?;
            }
        }
        Ok(())
    }
}

/// Preferences kept only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, SettingValue>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<SettingValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, SettingValue)>> {
        Ok(self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
