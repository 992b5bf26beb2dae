use crate::error::ToolError;
use crate::tools::base::{resolve_relay_url, Tool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use switchboard_connect::AppRegistry;

#[derive(Deserialize)]
struct LookupInput {
    app_name: String,
}

pub struct GetAppWebhookUrlTool {
    registry: Arc<AppRegistry>,
}

impl GetAppWebhookUrlTool {
    pub fn new(registry: Arc<AppRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for GetAppWebhookUrlTool {
    fn name(&self) -> &'static str {
        "get_app_webhook_url"
    }

    fn description(&self) -> &'static str {
        "Looks up the webhook URL configured for an application"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "app_name": {"type": "string"}
            },
            "required": ["app_name"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: LookupInput =
            serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;

        resolve_relay_url(&self.registry, &input.app_name)
    }
}
