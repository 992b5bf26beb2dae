use crate::error::ToolError;
use async_trait::async_trait;
use switchboard_connect::{AppRegistry, ConnectionType};

/// Agent-callable operation.
///
/// A tool resolves its own target application and performs one
/// synchronous outbound call. `execute` may fail with a `ToolError`;
/// the dispatcher converts that into the string contract the agent
/// sees, so no tool failure ever reaches the agent as an exception.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> serde_json::Value;

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

/// Resolves the relay endpoint for a webhook_relay application.
///
/// A missing entry, a mismatched connection type, and a missing
/// webhook_url all come back as `NotConfigured`: the integration is
/// not set up, which is an expected outcome, and no network call is
/// made.
pub(crate) fn resolve_relay_url(
    registry: &AppRegistry,
    app_name: &str,
) -> Result<String, ToolError> {
    let descriptor = registry.get(app_name).ok_or_else(|| {
        ToolError::NotConfigured(format!("application '{}' has no registry entry", app_name))
    })?;

    if descriptor.connection_type != ConnectionType::WebhookRelay {
        return Err(ToolError::NotConfigured(format!(
            "application '{}' is not configured for webhook relay",
            app_name
        )));
    }

    match descriptor.webhook_url() {
        Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
        _ => Err(ToolError::NotConfigured(format!(
            "application '{}' has no webhook_url configured",
            app_name
        ))),
    }
}
