use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transport used to reach a logical application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "webhook_relay")]
    WebhookRelay,
    #[serde(rename = "direct_api")]
    DirectApi,
}

/// Stored record describing how to reach one logical application.
///
/// `app_name` is the unique lookup key and is immutable once created;
/// renaming an application means deleting and re-adding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub app_name: String,
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

impl AppDescriptor {
    pub fn webhook_relay(app_name: &str, webhook_url: &str) -> Self {
        let mut config = HashMap::new();
        config.insert(
            "webhook_url".to_string(),
            serde_json::Value::String(webhook_url.to_string()),
        );
        Self {
            app_name: app_name.to_string(),
            connection_type: ConnectionType::WebhookRelay,
            credentials: HashMap::new(),
            config,
        }
    }

    pub fn direct_api(app_name: &str, credentials: HashMap<String, String>) -> Self {
        Self {
            app_name: app_name.to_string(),
            connection_type: ConnectionType::DirectApi,
            credentials,
            config: HashMap::new(),
        }
    }

    /// Relay endpoint for this application, if one is configured.
    pub fn webhook_url(&self) -> Option<&str> {
        self.config.get("webhook_url").and_then(|v| v.as_str())
    }
}

/// Partial update applied to an existing descriptor.
///
/// A field present in the patch replaces the descriptor's field
/// wholesale; nested maps are not deep-merged. There is no `app_name`
/// field: the key cannot be patched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorPatch {
    pub connection_type: Option<ConnectionType>,
    pub credentials: Option<HashMap<String, String>>,
    pub config: Option<HashMap<String, serde_json::Value>>,
}
