// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration categories: typed option schemas with current values.
//!
//! Every north service and every filter stage owns one category. Updates are
//! validated as a whole against the schema and produce a new category value;
//! the original is never touched, so a rejected update has no effect.

use crate::errors::ManagementError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type of a configuration item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ItemType {
    String,
    Password,
    Integer,
    Float,
    Boolean,
    /// Any valid JSON document.
    Json,
    Enumeration { options: Vec<String> },
}

impl ItemType {
    /// Validate a raw value and return its canonical text form.
    ///
    /// Floats always carry a decimal point (`"50"` becomes `"50.0"`) and
    /// booleans are lower-cased.
    pub fn normalize(&self, raw: &str) -> Result<String, String> {
        match self {
            ItemType::String | ItemType::Password => Ok(raw.to_string()),
            ItemType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(|v| v.to_string())
                .map_err(|_| format!("'{}' is not an integer", raw)),
            ItemType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| format!("{:?}", v))
                .ok_or_else(|| format!("'{}' is not a number", raw)),
            ItemType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err(format!("'{}' is not a boolean", raw)),
            },
            ItemType::Json => serde_json::from_str::<serde_json::Value>(raw)
                .map(|_| raw.to_string())
                .map_err(|e| format!("invalid JSON: {}", e)),
            ItemType::Enumeration { options } => {
                if options.iter().any(|o| o == raw) {
                    Ok(raw.to_string())
                } else {
                    Err(format!("'{}' is not one of [{}]", raw, options.join(", ")))
                }
            }
        }
    }
}

/// A single option inside a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub description: String,
    #[serde(flatten)]
    pub item_type: ItemType,
    pub default: String,
    pub value: String,
    #[serde(default)]
    pub readonly: bool,
}

impl ConfigItem {
    pub fn new(item_type: ItemType, description: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            description: description.into(),
            item_type,
            value: default.clone(),
            default,
            readonly: false,
        }
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Named option schema plus current values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCategory {
    pub name: String,
    pub description: String,
    pub items: BTreeMap<String, ConfigItem>,
}

impl ConfigCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, key: impl Into<String>, item: ConfigItem) -> Self {
        self.items.insert(key.into(), item);
        self
    }

    /// Same schema and values under a different category name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(|item| item.value.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v == "true")
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Current values only, as persisted.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.items
            .iter()
            .map(|(k, item)| (k.clone(), item.value.clone()))
            .collect()
    }

    /// Validate `changes` as a whole and return the updated category together
    /// with the items that were set.
    ///
    /// Unknown keys, read-only keys and values that do not parse as the item
    /// type reject the entire request.
    pub fn apply(
        &self,
        changes: &BTreeMap<String, String>,
    ) -> Result<(ConfigCategory, BTreeMap<String, ConfigItem>), ManagementError> {
        let mut problems = Vec::new();
        let mut normalized = BTreeMap::new();

        for (key, raw) in changes {
            match self.items.get(key) {
                None => problems.push(format!("unknown item '{}'", key)),
                Some(item) if item.readonly => problems.push(format!("item '{}' is read-only", key)),
                Some(item) => match item.item_type.normalize(raw) {
                    Ok(value) => {
                        normalized.insert(key.clone(), value);
                    }
                    Err(reason) => problems.push(format!("item '{}': {}", key, reason)),
                },
            }
        }

        if !problems.is_empty() {
            return Err(ManagementError::Validation(format!(
                "category '{}': {}",
                self.name,
                problems.join("; ")
            )));
        }

        let mut updated = self.clone();
        let mut applied = BTreeMap::new();
        for (key, value) in normalized {
            if let Some(item) = updated.items.get_mut(&key) {
                item.value = value;
                applied.insert(key, item.clone());
            }
        }

        Ok((updated, applied))
    }

    /// Restore persisted values, skipping keys the schema no longer knows and
    /// values it no longer accepts.
    pub fn restore_values(&mut self, values: &BTreeMap<String, String>) {
        for (key, raw) in values {
            let Some(item) = self.items.get_mut(key) else {
                tracing::warn!(category = %self.name, key = %key, "Dropping persisted value for unknown item");
                continue;
            };
            match item.item_type.normalize(raw) {
                Ok(value) => item.value = value,
                Err(reason) => {
                    tracing::warn!(category = %self.name, key = %key, %reason, "Dropping invalid persisted value")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigCategory {
        ConfigCategory::new("north_a", "test")
            .with_item("plugin", ConfigItem::new(ItemType::String, "Plugin", "capture").readonly())
            .with_item("enable", ConfigItem::new(ItemType::Boolean, "Enabled", "true"))
            .with_item("factor", ConfigItem::new(ItemType::Float, "Scale factor", "100.0"))
            .with_item("blockSize", ConfigItem::new(ItemType::Integer, "Batch size", "500"))
            .with_item(
                "mode",
                ConfigItem::new(
                    ItemType::Enumeration {
                        options: vec!["basic".into(), "anonymous".into()],
                    },
                    "Auth",
                    "basic",
                ),
            )
    }

    fn changes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_float_values_are_normalized() {
        let (updated, applied) = sample().apply(&changes(&[("factor", "50")])).unwrap();
        assert_eq!(updated.get("factor"), Some("50.0"));
        assert_eq!(applied["factor"].value, "50.0");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_boolean_values_are_lowercased() {
        let (updated, _) = sample().apply(&changes(&[("enable", "FALSE")])).unwrap();
        assert_eq!(updated.get_bool("enable"), Some(false));
    }

    #[test]
    fn test_unknown_key_rejects_whole_request() {
        let original = sample();
        let result = original.apply(&changes(&[("factor", "2"), ("bogus", "1")]));
        match result {
            Err(ManagementError::Validation(msg)) => assert!(msg.contains("unknown item 'bogus'")),
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(original.get("factor"), Some("100.0"));
    }

    #[test]
    fn test_readonly_and_type_errors_are_reported_together() {
        let result = sample().apply(&changes(&[("plugin", "other"), ("blockSize", "ten")]));
        let Err(ManagementError::Validation(msg)) = result else {
            panic!("Expected validation error");
        };
        assert!(msg.contains("read-only"));
        assert!(msg.contains("not an integer"));
    }

    #[test]
    fn test_enumeration_must_match_an_option() {
        assert!(sample().apply(&changes(&[("mode", "anonymous")])).is_ok());
        assert!(sample().apply(&changes(&[("mode", "kerberos")])).is_err());
    }

    #[test]
    fn test_restore_values_skips_unknown_and_invalid() {
        let mut category = sample();
        category.restore_values(&changes(&[("factor", "3"), ("gone", "x"), ("blockSize", "nope")]));
        assert_eq!(category.get("factor"), Some("3.0"));
        assert_eq!(category.get("blockSize"), Some("500"));
        assert!(category.get("gone").is_none());
    }

    #[test]
    fn test_json_item_validation() {
        let item = ItemType::Json;
        assert!(item.normalize(r#"{"site": "a"}"#).is_ok());
        assert!(item.normalize("{not json").is_err());
    }
}
