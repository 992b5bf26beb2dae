use crate::registry::ToolRegistry;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

/// Runs agent tool calls against the registry.
///
/// Every call returns a string: successful tool output as-is, every
/// failure (unknown tool, malformed arguments, transport fault,
/// timeout) as a message carrying the `Error:` prefix. Nothing escapes
/// `dispatch` as an Err or a panic, so the agent always has a text
/// artifact to relay.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout_ms: u64,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, timeout_ms: u64) -> Self {
        Self {
            registry,
            timeout_ms,
        }
    }

    pub async fn dispatch(&self, tool_name: &str, args: serde_json::Value) -> String {
        info!(tool = tool_name, "dispatching tool call");

        let tool = match self.registry.get(tool_name) {
            Some(tool) => tool,
            None => {
                warn!(tool = tool_name, "unknown tool requested");
                return format!("Error: unknown tool '{}'", tool_name);
            }
        };

        // Spawned so a panicking tool is isolated from the caller.
        let handle = tokio::spawn(async move { tool.execute(args).await });

        match timeout(Duration::from_millis(self.timeout_ms), handle).await {
            Ok(Ok(Ok(message))) => message,
            Ok(Ok(Err(e))) => {
                warn!(tool = tool_name, error = %e, "tool call failed");
                format!("Error: {}", e)
            }
            Ok(Err(join_err)) => {
                warn!(tool = tool_name, error = %join_err, "tool task aborted");
                format!("Error: tool '{}' aborted unexpectedly", tool_name)
            }
            Err(_) => {
                warn!(
                    tool = tool_name,
                    timeout_ms = self.timeout_ms,
                    "tool call timed out"
                );
                format!("Error: tool '{}' timed out", tool_name)
            }
        }
    }
}
