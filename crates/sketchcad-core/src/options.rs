//! String-keyed option store read by commands and the snap engine.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single option value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl OptionValue {
    fn as_bool(self) -> bool {
        match self {
            OptionValue::Bool(v) => v,
            OptionValue::Int(v) => v != 0,
            OptionValue::Float(v) => v != 0.0,
        }
    }

    fn as_int(self) -> i64 {
        match self {
            OptionValue::Bool(v) => v as i64,
            OptionValue::Int(v) => v,
            OptionValue::Float(v) => v as i64,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            OptionValue::Bool(v) => v as i64 as f64,
            OptionValue::Int(v) => v as f64,
            OptionValue::Float(v) => v,
        }
    }
}

/// Key/value option store. Missing keys fall back to the caller's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: HashMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.values.get(name).copied()
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get(name).map_or(default, OptionValue::as_bool)
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.get(name).map_or(default, OptionValue::as_int)
    }

    pub fn get_float(&self, name: &str, default: f64) -> f64 {
        self.get(name).map_or(default, OptionValue::as_float)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.values.insert(name.to_string(), OptionValue::Bool(value));
    }

    pub fn set_int(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), OptionValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), OptionValue::Float(value));
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a flat JSON object of bools and numbers.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut options = Self::new();
        for (key, value) in raw {
            let value = match value {
                serde_json::Value::Bool(b) => OptionValue::Bool(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => OptionValue::Int(i),
                    None => OptionValue::Float(n.as_f64().unwrap_or_default()),
                },
                _ => return Err(ConfigError::WrongType { key }),
            };
            options.values.insert(key, value);
        }
        Ok(options)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
