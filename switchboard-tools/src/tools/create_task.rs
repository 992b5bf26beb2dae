use crate::error::ToolError;
use crate::tools::base::{resolve_relay_url, Tool};
use crate::webhook::WebhookRelay;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use switchboard_connect::AppRegistry;

const TARGET_APP: &str = "task_manager";

#[derive(Deserialize)]
struct CreateTaskInput {
    task_name: String,
    due_date: Option<String>,
    description: Option<String>,
    assignee: Option<String>,
}

/// Optional fields serialize as explicit nulls so the relay scenario
/// always sees every parameter slot.
#[derive(Serialize)]
struct CreateTaskPayload {
    action: &'static str,
    task_name: String,
    due_date: Option<String>,
    description: Option<String>,
    assignee: Option<String>,
}

pub struct CreateTaskTool {
    registry: Arc<AppRegistry>,
    relay: WebhookRelay,
}

impl CreateTaskTool {
    pub fn new(registry: Arc<AppRegistry>, relay: WebhookRelay) -> Self {
        Self { registry, relay }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &'static str {
        "create_task"
    }

    fn description(&self) -> &'static str {
        "Creates a task in the connected task management system"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task_name": {"type": "string"},
                "due_date": {"type": "string"},
                "description": {"type": "string"},
                "assignee": {"type": "string"}
            },
            "required": ["task_name"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: CreateTaskInput =
            serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;

        let webhook_url = resolve_relay_url(&self.registry, TARGET_APP)?;
        let payload = CreateTaskPayload {
            action: "create_task",
            task_name: input.task_name,
            due_date: input.due_date,
            description: input.description,
            assignee: input.assignee,
        };

        let body = self.relay.post(&webhook_url, &payload).await?;
        Ok(format!("Task request delivered. Relay response: {}", body))
    }
}
