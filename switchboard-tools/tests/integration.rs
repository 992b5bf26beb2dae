use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use switchboard_connect::{AppDescriptor, AppRegistry};
use switchboard_tools::tools::*;
use switchboard_tools::*;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Minimal loopback HTTP endpoint standing in for a relay platform.
/// Captures every request body and answers with a canned response.
async fn spawn_endpoint(
    status_line: &'static str,
    response_body: &'static str,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];

                let headers_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                    if buf.len() > 65536 {
                        return;
                    }
                };

                let headers = String::from_utf8_lossy(&buf[..headers_end]).to_string();
                let content_length = headers
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);

                while buf.len() < headers_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let body_end = (headers_end + content_length).min(buf.len());
                let request_body = String::from_utf8_lossy(&buf[headers_end..body_end]).to_string();
                let _ = tx.send(request_body);

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    response_body.len(),
                    response_body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), rx)
}

async fn next_request(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("endpoint saw no request")
        .expect("endpoint channel closed")
}

fn open_registry(temp: &TempDir) -> Arc<AppRegistry> {
    Arc::new(AppRegistry::open(temp.path().join("applications.json")).unwrap())
}

fn dispatcher_for(apps: Arc<AppRegistry>) -> ToolDispatcher {
    let relay = WebhookRelay::with_timeout(Duration::from_secs(5));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(DispatchWebhookTool::new(relay.clone())))
        .register(Arc::new(GetAppWebhookUrlTool::new(apps.clone())))
        .register(Arc::new(CreateTaskTool::new(apps.clone(), relay.clone())))
        .register(Arc::new(PostToSocialMediaTool::new(apps.clone(), relay)))
        .register(Arc::new(SendEmailTool::new(
            apps,
            GmailMailer::with_timeout(Duration::from_secs(5)),
        )));
    ToolDispatcher::new(Arc::new(registry), 10_000)
}

#[tokio::test]
async fn test_create_task_posts_expected_payload() {
    let (url, mut rx) = spawn_endpoint("200 OK", "accepted").await;
    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    apps.add(AppDescriptor::webhook_relay("task_manager", &url))
        .unwrap();

    let result = dispatcher_for(apps)
        .dispatch(
            "create_task",
            json!({"task_name": "Report", "due_date": "2025-07-30"}),
        )
        .await;

    assert!(!result.starts_with("Error:"), "unexpected failure: {}", result);
    assert!(result.contains("accepted"));

    // Optional arguments ride along as explicit nulls.
    let sent: serde_json::Value = serde_json::from_str(&next_request(&mut rx).await).unwrap();
    assert_eq!(
        sent,
        json!({
            "action": "create_task",
            "task_name": "Report",
            "due_date": "2025-07-30",
            "description": null,
            "assignee": null
        })
    );
}

#[tokio::test]
async fn test_post_to_social_media_scenario() {
    let (url, mut rx) = spawn_endpoint("200 OK", "queued").await;
    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    apps.add(AppDescriptor::webhook_relay("social_media_poster", &url))
        .unwrap();

    let result = dispatcher_for(apps)
        .dispatch(
            "post_to_social_media",
            json!({"content": "Hello", "platform": "facebook"}),
        )
        .await;

    assert!(!result.starts_with("Error:"), "unexpected failure: {}", result);

    let sent: serde_json::Value = serde_json::from_str(&next_request(&mut rx).await).unwrap();
    assert_eq!(
        sent,
        json!({
            "action": "post_content",
            "content": "Hello",
            "platform": "facebook",
            "image_url": null
        })
    );
}

#[tokio::test]
async fn test_dispatch_webhook_posts_payload_verbatim() {
    let (url, mut rx) = spawn_endpoint("200 OK", "ok").await;
    let temp = TempDir::new().unwrap();

    let result = dispatcher_for(open_registry(&temp))
        .dispatch(
            "dispatch_webhook",
            json!({"webhook_url": url, "payload": {"event": "ping", "count": 3}}),
        )
        .await;

    assert!(!result.starts_with("Error:"), "unexpected failure: {}", result);

    let sent: serde_json::Value = serde_json::from_str(&next_request(&mut rx).await).unwrap();
    assert_eq!(sent, json!({"event": "ping", "count": 3}));
}

#[tokio::test]
async fn test_relay_server_error_surfaces_as_error_string() {
    let (url, _rx) = spawn_endpoint("500 Internal Server Error", "boom").await;
    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    apps.add(AppDescriptor::webhook_relay("task_manager", &url))
        .unwrap();

    let result = dispatcher_for(apps)
        .dispatch("create_task", json!({"task_name": "Report"}))
        .await;

    assert!(result.starts_with("Error:"), "expected failure, got: {}", result);
    assert!(result.contains("500"));
}

#[tokio::test]
async fn test_unresolved_application_makes_no_network_call() {
    let (url, mut rx) = spawn_endpoint("200 OK", "ok").await;
    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    // Only the social poster is configured; task_manager is absent.
    apps.add(AppDescriptor::webhook_relay("social_media_poster", &url))
        .unwrap();

    let result = dispatcher_for(apps)
        .dispatch("create_task", json!({"task_name": "Report"}))
        .await;

    assert!(result.starts_with("Error:"));
    assert!(result.contains("task_manager"));
    assert!(rx.try_recv().is_err(), "no request should have been sent");
}

#[tokio::test]
async fn test_connection_refused_surfaces_as_error_string() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    apps.add(AppDescriptor::webhook_relay("task_manager", &url))
        .unwrap();

    let result = dispatcher_for(apps)
        .dispatch("create_task", json!({"task_name": "Report"}))
        .await;

    assert!(result.starts_with("Error:"), "expected failure, got: {}", result);
}

#[tokio::test]
async fn test_send_email_refreshes_token_and_sends() {
    let (token_url, mut token_rx) =
        spawn_endpoint("200 OK", r#"{"access_token": "tok-1", "expires_in": 3599}"#).await;
    let (send_url, mut send_rx) = spawn_endpoint("200 OK", r#"{"id": "msg-001"}"#).await;

    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    let mut credentials = std::collections::HashMap::new();
    credentials.insert("client_id".to_string(), "cid".to_string());
    credentials.insert("client_secret".to_string(), "csecret".to_string());
    credentials.insert("refresh_token".to_string(), "rtoken".to_string());
    apps.add(AppDescriptor::direct_api("gmail_send_email", credentials))
        .unwrap();

    let mailer = GmailMailer::with_timeout(Duration::from_secs(5))
        .with_endpoints(&token_url, &send_url);
    let tool = SendEmailTool::new(apps, mailer);

    let result = tool
        .execute(json!({
            "to": "dest@example.com",
            "subject": "Weekly report",
            "message_text": "All done."
        }))
        .await
        .unwrap();
    assert!(result.contains("msg-001"));

    let token_request = next_request(&mut token_rx).await;
    assert!(token_request.contains("grant_type=refresh_token"));
    assert!(token_request.contains("refresh_token=rtoken"));

    let send_request: serde_json::Value =
        serde_json::from_str(&next_request(&mut send_rx).await).unwrap();
    let raw = send_request["raw"].as_str().unwrap();
    use base64::Engine;
    let decoded = base64::engine::general_purpose::URL_SAFE.decode(raw).unwrap();
    let message = String::from_utf8(decoded).unwrap();
    assert!(message.contains("To: dest@example.com"));
    assert!(message.contains("Subject: Weekly report"));
    assert!(message.ends_with("All done."));
}

#[tokio::test]
async fn test_send_email_missing_credentials_is_error_string() {
    let temp = TempDir::new().unwrap();
    let apps = open_registry(&temp);
    apps.add(AppDescriptor::direct_api(
        "gmail_send_email",
        Default::default(),
    ))
    .unwrap();

    let result = dispatcher_for(apps)
        .dispatch(
            "send_email",
            json!({"to": "a@b.c", "subject": "s", "message_text": "m"}),
        )
        .await;

    assert!(result.starts_with("Error:"));
    assert!(result.contains("credential"));
}

#[tokio::test]
async fn test_dispatcher_enforces_timeout() {
    struct SleepTool;

    #[async_trait::async_trait]
    impl Tool for SleepTool {
        fn name(&self) -> &'static str {
            "sleep"
        }
        fn description(&self) -> &'static str {
            "Sleeps forever"
        }
        fn schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("never".to_string())
        }
    }

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SleepTool));
    let dispatcher = ToolDispatcher::new(Arc::new(registry), 100);

    let result = dispatcher.dispatch("sleep", json!({})).await;
    assert!(result.starts_with("Error:"));
    assert!(result.contains("timed out"));
}
