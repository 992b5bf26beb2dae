use crate::error::ToolError;
use crate::gmail::GmailMailer;
use crate::tools::base::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use switchboard_connect::{AppRegistry, ConnectionType};

const TARGET_APP: &str = "gmail_send_email";

#[derive(Deserialize)]
struct SendEmailInput {
    to: String,
    subject: String,
    message_text: String,
}

pub struct SendEmailTool {
    registry: Arc<AppRegistry>,
    mailer: GmailMailer,
}

impl SendEmailTool {
    pub fn new(registry: Arc<AppRegistry>, mailer: GmailMailer) -> Self {
        Self { registry, mailer }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &'static str {
        "send_email"
    }

    fn description(&self) -> &'static str {
        "Sends an email through the connected Gmail account"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "to": {"type": "string"},
                "subject": {"type": "string"},
                "message_text": {"type": "string"}
            },
            "required": ["to", "subject", "message_text"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: SendEmailInput =
            serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;

        let descriptor = self.registry.get(TARGET_APP).ok_or_else(|| {
            ToolError::NotConfigured(format!(
                "application '{}' has no registry entry",
                TARGET_APP
            ))
        })?;
        if descriptor.connection_type != ConnectionType::DirectApi {
            return Err(ToolError::NotConfigured(format!(
                "application '{}' is not configured for direct API access",
                TARGET_APP
            )));
        }

        let message_id = self
            .mailer
            .send(
                &descriptor.credentials,
                &input.to,
                &input.subject,
                &input.message_text,
            )
            .await?;
        Ok(format!("Email sent successfully. Message id: {}", message_id))
    }
}
