use crate::error::ToolError;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// The source of this design left outbound calls unbounded; a finite
/// default keeps a stalled relay endpoint from blocking a call forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Adapter for pre-authorized relay endpoints (e.g. a Make.com
/// scenario webhook). One JSON POST per call; the relay platform
/// performs the actual multi-step integration and holds its own
/// credentials, so no authentication header is added here.
#[derive(Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
}

impl WebhookRelay {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// POSTs `payload` as JSON and returns the response body verbatim.
    ///
    /// Any 4xx/5xx status or transport failure becomes a `Transport`
    /// error; the caller turns it into an error string for the agent.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        webhook_url: &str,
        payload: &T,
    ) -> Result<String, ToolError> {
        debug!(url = webhook_url, "posting to webhook relay");

        let response = self
            .client
            .post(webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout
                } else {
                    ToolError::Transport(format!("request to {} failed: {}", webhook_url, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read relay response: {}", e)))?;

        if status.is_client_error() || status.is_server_error() {
            warn!(url = webhook_url, status = %status, "webhook relay rejected the request");
            return Err(ToolError::Transport(format!(
                "relay returned HTTP {}: {}",
                status, body
            )));
        }

        debug!(url = webhook_url, status = %status, "webhook relay accepted the request");
        Ok(body)
    }
}

impl Default for WebhookRelay {
    fn default() -> Self {
        Self::new()
    }
}
