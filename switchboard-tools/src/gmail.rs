use crate::error::ToolError;
use crate::webhook::DEFAULT_TIMEOUT;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const SEND_ENDPOINT: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Direct Gmail API adapter.
///
/// Exchanges the stored refresh token for an access token, assembles
/// the RFC 2822 message, and calls `users/me/messages/send` with the
/// base64url-encoded raw body. Required credential fields are checked
/// here, at call time, not by the application registry.
#[derive(Clone)]
pub struct GmailMailer {
    client: reqwest::Client,
    token_endpoint: String,
    send_endpoint: String,
}

impl GmailMailer {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            send_endpoint: SEND_ENDPOINT.to_string(),
        }
    }

    /// Overrides the provider endpoints. Used by tests to point the
    /// adapter at a loopback listener.
    pub fn with_endpoints(mut self, token_endpoint: &str, send_endpoint: &str) -> Self {
        self.token_endpoint = token_endpoint.to_string();
        self.send_endpoint = send_endpoint.to_string();
        self
    }

    /// Sends one plain-text email and returns the provider message id.
    pub async fn send(
        &self,
        credentials: &HashMap<String, String>,
        to: &str,
        subject: &str,
        message_text: &str,
    ) -> Result<String, ToolError> {
        let client_id = required_credential(credentials, "client_id")?;
        let client_secret = required_credential(credentials, "client_secret")?;
        let refresh_token = required_credential(credentials, "refresh_token")?;

        let access_token = self
            .refresh_access_token(client_id, client_secret, refresh_token)
            .await?;

        let raw = URL_SAFE.encode(rfc2822_message(to, subject, message_text));
        debug!(to, "sending email via Gmail API");

        let response = self
            .client
            .post(&self.send_endpoint)
            .bearer_auth(&access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout
                } else {
                    ToolError::Transport(format!("Gmail send request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read Gmail response: {}", e)))?;

        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, "Gmail API rejected the send request");
            return Err(ToolError::Transport(format!(
                "Gmail API returned HTTP {}: {}",
                status, body
            )));
        }

        let sent: SendResponse = serde_json::from_str(&body)
            .map_err(|e| ToolError::Transport(format!("malformed Gmail response: {}", e)))?;
        Ok(sent.id)
    }

    async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<String, ToolError> {
        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout
                } else {
                    ToolError::Transport(format!("token refresh request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read token response: {}", e)))?;

        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, "OAuth token endpoint rejected the refresh");
            return Err(ToolError::Transport(format!(
                "token endpoint returned HTTP {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ToolError::Transport(format!("malformed token response: {}", e)))?;
        Ok(token.access_token)
    }
}

impl Default for GmailMailer {
    fn default() -> Self {
        Self::new()
    }
}

fn required_credential<'a>(
    credentials: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, ToolError> {
    match credentials.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.as_str()),
        _ => Err(ToolError::Validation(format!(
            "missing Gmail credential '{}'",
            key
        ))),
    }
}

fn rfc2822_message(to: &str, subject: &str, message_text: &str) -> String {
    format!(
        "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        to, subject, message_text
    )
}
