// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backends::north::transport::{Transport, TransportRequest};
use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::model::Reading;
use crate::traits::{DeliveryResult, NorthConnector};

pub const URL_ITEM: &str = "url";
pub const USERNAME_ITEM: &str = "username";
pub const PASSWORD_ITEM: &str = "password";
pub const FULL_STRUCTURE_ITEM: &str = "SendFullStructure";

/// HTTP JSON connector - posts each batch as a JSON document
///
/// The payload always holds a `readings` array. With `SendFullStructure`
/// set it also holds a `structure` section naming every asset's datapoints
/// and their types. A non-empty `username` adds a `Basic` authorization
/// header.
///
/// Status handling:
/// - `2xx` - delivered
/// - `400`, `413`, `422` - the sink will never take this batch, rejected
/// - anything else, or no answer at all - transient, retried
pub struct HttpJsonConnector {
    transport: Arc<dyn Transport>,
}

impl HttpJsonConnector {
    pub const PLUGIN: &'static str = "http_json";

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category
            .with_item(
                URL_ITEM,
                ConfigItem::new(ItemType::String, "Sink endpoint", "http://localhost:8118/ingress/messages"),
            )
            .with_item(USERNAME_ITEM, ConfigItem::new(ItemType::String, "Sink user", ""))
            .with_item(PASSWORD_ITEM, ConfigItem::new(ItemType::Password, "Sink password", ""))
            .with_item(
                FULL_STRUCTURE_ITEM,
                ConfigItem::new(ItemType::Boolean, "Describe asset structure in every payload", "true"),
            )
    }

    /// `Basic` header value for a user and password.
    pub fn basic_authorization(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
    }

    pub fn encode(batch: &[Reading], full_structure: bool) -> Value {
        let readings: Vec<Value> = batch
            .iter()
            .map(|r| {
                json!({
                    "asset": r.asset_code,
                    "timestamp": r.timestamp.to_rfc3339(),
                    "readings": r.datapoints,
                })
            })
            .collect();

        let mut payload = json!({ "readings": readings });
        if full_structure {
            let mut structure: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
            for reading in batch {
                let types = structure.entry(reading.asset_code.as_str()).or_default();
                for (name, value) in &reading.datapoints {
                    types.insert(name.as_str(), value.type_name());
                }
            }
            payload["structure"] = json!(structure);
        }
        payload
    }

    fn classify(status: u16, count: usize) -> DeliveryResult {
        match status {
            200..=299 => DeliveryResult::Delivered(count),
            400 | 413 | 422 => DeliveryResult::Rejected(format!("sink answered {}", status)),
            _ => DeliveryResult::TransientFailure(format!("sink answered {}", status)),
        }
    }
}

#[async_trait]
impl NorthConnector for HttpJsonConnector {
    async fn send(&self, batch: &[Reading], options: &ConfigCategory) -> DeliveryResult {
        let full_structure = options.get_bool(FULL_STRUCTURE_ITEM).unwrap_or(true);
        let body = match serde_json::to_vec(&Self::encode(batch, full_structure)) {
            Ok(body) => body,
            Err(e) => return DeliveryResult::Rejected(format!("cannot encode batch: {}", e)),
        };

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let username = options.get(USERNAME_ITEM).unwrap_or_default();
        if !username.is_empty() {
            let password = options.get(PASSWORD_ITEM).unwrap_or_default();
            headers.insert(
                "Authorization".to_string(),
                Self::basic_authorization(username, password),
            );
        }

        let request = TransportRequest {
            url: options.get(URL_ITEM).unwrap_or_default().to_string(),
            headers,
            body,
        };

        match self.transport.post(request).await {
            Ok(status) => Self::classify(status, batch.len()),
            Err(reason) => DeliveryResult::TransientFailure(reason),
        }
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}
