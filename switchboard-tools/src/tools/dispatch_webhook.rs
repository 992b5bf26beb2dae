use crate::error::ToolError;
use crate::tools::base::Tool;
use crate::webhook::WebhookRelay;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct DispatchInput {
    webhook_url: String,
    payload: serde_json::Value,
}

/// Escape hatch: posts a caller-supplied payload to a caller-supplied
/// relay URL, with no registry resolution and no `action` wrapping.
pub struct DispatchWebhookTool {
    relay: WebhookRelay,
}

impl DispatchWebhookTool {
    pub fn new(relay: WebhookRelay) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl Tool for DispatchWebhookTool {
    fn name(&self) -> &'static str {
        "dispatch_webhook"
    }

    fn description(&self) -> &'static str {
        "Sends a JSON payload to a webhook URL"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "webhook_url": {"type": "string"},
                "payload": {"type": "object"}
            },
            "required": ["webhook_url", "payload"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: DispatchInput =
            serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;

        if !input.payload.is_object() {
            return Err(ToolError::Validation(
                "payload must be a JSON object".to_string(),
            ));
        }
        if input.webhook_url.trim().is_empty() {
            return Err(ToolError::Validation(
                "webhook_url must be non-empty".to_string(),
            ));
        }

        let body = self.relay.post(&input.webhook_url, &input.payload).await?;
        Ok(format!("Payload delivered. Relay response: {}", body))
    }
}
