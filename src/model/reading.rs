// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single typed datapoint value carried by a [`Reading`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatapointValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl DatapointValue {
    /// Numeric view of the value, `None` for strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DatapointValue::Integer(i) => Some(*i as f64),
            DatapointValue::Float(f) => Some(*f),
            DatapointValue::String(_) => None,
        }
    }

    /// Type name used when describing asset structure to a sink.
    pub fn type_name(&self) -> &'static str {
        match self {
            DatapointValue::Integer(_) => "integer",
            DatapointValue::Float(_) => "float",
            DatapointValue::String(_) => "string",
        }
    }

    /// Convert a JSON scalar into a datapoint value.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(DatapointValue::Integer)
                .or_else(|| n.as_f64().map(DatapointValue::Float)),
            serde_json::Value::String(s) => Some(DatapointValue::String(s.clone())),
            serde_json::Value::Bool(b) => Some(DatapointValue::Integer(i64::from(*b))),
            _ => None,
        }
    }
}

impl fmt::Display for DatapointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatapointValue::Integer(i) => write!(f, "{}", i),
            DatapointValue::Float(v) => write!(f, "{}", v),
            DatapointValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// One timestamped sample for an asset.
///
/// Readings are never mutated in place once they leave a south service;
/// filters consume them by value and hand back new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub asset_code: String,
    pub timestamp: DateTime<Utc>,
    pub datapoints: BTreeMap<String, DatapointValue>,
    /// Name of the south service that produced the reading.
    pub origin: String,
}

impl Reading {
    pub fn new(asset_code: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            asset_code: asset_code.into(),
            timestamp: Utc::now(),
            datapoints: BTreeMap::new(),
            origin: origin.into(),
        }
    }

    /// Builder-style datapoint insertion.
    pub fn with_datapoint(mut self, name: impl Into<String>, value: DatapointValue) -> Self {
        self.datapoints.insert(name.into(), value);
        self
    }

    pub fn datapoint(&self, name: &str) -> Option<&DatapointValue> {
        self.datapoints.get(name)
    }
}

/// Ordered group of readings moved through the pipeline and connector together.
pub type Batch = Vec<Reading>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datapoint_numeric_view() {
        assert_eq!(DatapointValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(DatapointValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(DatapointValue::String("x".into()).as_f64(), None);
    }

    #[test]
    fn test_datapoint_from_json() {
        let value = serde_json::json!(7);
        assert_eq!(DatapointValue::from_json(&value), Some(DatapointValue::Integer(7)));
        let value = serde_json::json!(0.25);
        assert_eq!(DatapointValue::from_json(&value), Some(DatapointValue::Float(0.25)));
        let value = serde_json::json!("site-a");
        assert_eq!(
            DatapointValue::from_json(&value),
            Some(DatapointValue::String("site-a".into()))
        );
        assert_eq!(DatapointValue::from_json(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn test_reading_serializes_untagged_values() {
        let reading = Reading::new("pump", "south-1")
            .with_datapoint("speed", DatapointValue::Integer(12))
            .with_datapoint("label", DatapointValue::String("a".into()));

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["datapoints"]["speed"], serde_json::json!(12));
        assert_eq!(json["datapoints"]["label"], serde_json::json!("a"));

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);
    }
}
