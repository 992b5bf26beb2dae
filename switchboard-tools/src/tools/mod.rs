pub mod base;
pub mod create_task;
pub mod dispatch_webhook;
pub mod post_social;
pub mod send_email;
pub mod webhook_url;

pub use base::Tool;
pub use create_task::CreateTaskTool;
pub use dispatch_webhook::DispatchWebhookTool;
pub use post_social::PostToSocialMediaTool;
pub use send_email::SendEmailTool;
pub use webhook_url::GetAppWebhookUrlTool;
