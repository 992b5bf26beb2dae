use crate::error::ToolError;
use crate::tools::base::{resolve_relay_url, Tool};
use crate::webhook::WebhookRelay;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use switchboard_connect::AppRegistry;

const TARGET_APP: &str = "social_media_poster";

#[derive(Deserialize)]
struct PostInput {
    content: String,
    platform: String,
    image_url: Option<String>,
}

#[derive(Serialize)]
struct PostPayload {
    action: &'static str,
    content: String,
    platform: String,
    image_url: Option<String>,
}

pub struct PostToSocialMediaTool {
    registry: Arc<AppRegistry>,
    relay: WebhookRelay,
}

impl PostToSocialMediaTool {
    pub fn new(registry: Arc<AppRegistry>, relay: WebhookRelay) -> Self {
        Self { registry, relay }
    }
}

#[async_trait]
impl Tool for PostToSocialMediaTool {
    fn name(&self) -> &'static str {
        "post_to_social_media"
    }

    fn description(&self) -> &'static str {
        "Publishes content to a social media platform"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {"type": "string"},
                "platform": {"type": "string"},
                "image_url": {"type": "string"}
            },
            "required": ["content", "platform"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: PostInput =
            serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;

        let webhook_url = resolve_relay_url(&self.registry, TARGET_APP)?;
        let payload = PostPayload {
            action: "post_content",
            content: input.content,
            platform: input.platform,
            image_url: input.image_url,
        };

        let body = self.relay.post(&webhook_url, &payload).await?;
        Ok(format!("Post request delivered. Relay response: {}", body))
    }
}
