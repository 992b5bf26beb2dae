use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use switchboard_app::config::{Config, DEFAULT_CONFIG_PATH};
use switchboard_connect::{AppDescriptor, AppRegistry, ConnectionType, DescriptorPatch};
use switchboard_tools::tools::{
    CreateTaskTool, DispatchWebhookTool, GetAppWebhookUrlTool, PostToSocialMediaTool,
    SendEmailTool,
};
use switchboard_tools::{GmailMailer, Tool, ToolDispatcher, ToolRegistry, WebhookRelay};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load(Path::new(DEFAULT_CONFIG_PATH))?;

    match args.get(1).map(String::as_str) {
        Some("apps") => handle_apps(&config, &args[2..]),
        Some("tools") => handle_tools(&config),
        Some("call") => handle_call(&config, &args[2..]).await,
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}\n", other);
            print_usage();
            std::process::exit(2);
        }
    }
}

fn open_registry(config: &Config) -> Result<Arc<AppRegistry>> {
    let registry = AppRegistry::open(&config.store_path).with_context(|| {
        format!(
            "Failed to open application store at {}",
            config.store_path.display()
        )
    })?;
    Ok(Arc::new(registry))
}

fn build_core(config: &Config) -> Result<(Arc<AppRegistry>, Arc<ToolRegistry>, ToolDispatcher)> {
    let apps = open_registry(config)?;
    let timeout = Duration::from_secs(config.call_timeout_secs);
    let relay = WebhookRelay::with_timeout(timeout);
    let mailer = GmailMailer::with_timeout(timeout);

    let mut tools = ToolRegistry::new();
    tools
        .register(Arc::new(DispatchWebhookTool::new(relay.clone())))
        .register(Arc::new(GetAppWebhookUrlTool::new(apps.clone())))
        .register(Arc::new(CreateTaskTool::new(apps.clone(), relay.clone())))
        .register(Arc::new(PostToSocialMediaTool::new(apps.clone(), relay)))
        .register(Arc::new(SendEmailTool::new(apps.clone(), mailer)));
    let tools = Arc::new(tools);

    // Dispatcher ceiling sits above the client timeout so the adapter's
    // more specific error is the one that surfaces.
    let dispatcher = ToolDispatcher::new(tools.clone(), config.call_timeout_secs * 1000 + 5_000);
    Ok((apps, tools, dispatcher))
}

fn handle_apps(config: &Config, args: &[String]) -> Result<()> {
    let registry = open_registry(config)?;

    match args.first().map(String::as_str) {
        Some("list") | None => {
            let apps = registry.list();
            if apps.is_empty() {
                println!("No applications configured.");
                return Ok(());
            }
            for app in apps {
                let transport = match app.connection_type {
                    ConnectionType::WebhookRelay => "webhook_relay",
                    ConnectionType::DirectApi => "direct_api",
                };
                println!(
                    "{:<24} {:<14} {}",
                    app.app_name,
                    transport,
                    app.webhook_url().unwrap_or("-")
                );
            }
            Ok(())
        }
        Some("add") => {
            let json = args
                .get(1)
                .context("Usage: switchboard apps add <descriptor-json>")?;
            let descriptor: AppDescriptor =
                serde_json::from_str(json).context("Descriptor is not valid JSON")?;
            let name = descriptor.app_name.clone();
            registry.add(descriptor)?;
            println!("Added '{}'", name);
            Ok(())
        }
        Some("update") => {
            let name = args
                .get(1)
                .context("Usage: switchboard apps update <name> <patch-json>")?;
            let json = args
                .get(2)
                .context("Usage: switchboard apps update <name> <patch-json>")?;
            let patch: DescriptorPatch =
                serde_json::from_str(json).context("Patch is not valid JSON")?;
            registry.update(name, patch)?;
            println!("Updated '{}'", name);
            Ok(())
        }
        Some("show") => {
            let name = args.get(1).context("Usage: switchboard apps show <name>")?;
            match registry.get(name) {
                Some(mut app) => {
                    // Secret material never reaches the terminal.
                    for value in app.credentials.values_mut() {
                        *value = "***".to_string();
                    }
                    println!("{}", serde_json::to_string_pretty(&app)?);
                    Ok(())
                }
                None => bail!("Application '{}' is not configured", name),
            }
        }
        Some("remove") => {
            let name = args
                .get(1)
                .context("Usage: switchboard apps remove <name>")?;
            registry.delete(name)?;
            println!("Removed '{}'", name);
            Ok(())
        }
        Some(other) => bail!("Unknown apps subcommand: {}", other),
    }
}

fn handle_tools(config: &Config) -> Result<()> {
    let (_apps, tools, _dispatcher) = build_core(config)?;
    let mut names = tools.list();
    names.sort();
    for name in names {
        if let Some(tool) = tools.get(&name) {
            println!("{:<22} {}", name, tool.description());
        }
    }
    Ok(())
}

async fn handle_call(config: &Config, args: &[String]) -> Result<()> {
    let tool_name = args
        .first()
        .context("Usage: switchboard call <tool> [json-args]")?;
    let raw_args = args.get(1).map(String::as_str).unwrap_or("{}");
    let call_args: serde_json::Value =
        serde_json::from_str(raw_args).context("Tool arguments are not valid JSON")?;

    let (_apps, _tools, dispatcher) = build_core(config)?;
    let outcome = dispatcher.dispatch(tool_name, call_args).await;
    println!("{}", outcome);
    Ok(())
}

fn print_usage() {
    println!("switchboard - personal assistant integration hub");
    println!();
    println!("Usage:");
    println!("  switchboard apps list                      List configured applications");
    println!("  switchboard apps add <descriptor-json>     Register an application");
    println!("  switchboard apps update <name> <patch>     Patch an application");
    println!("  switchboard apps show <name>               Show one application");
    println!("  switchboard apps remove <name>             Delete an application");
    println!("  switchboard tools                          List agent-callable tools");
    println!("  switchboard call <tool> [json-args]        Run one tool call");
    println!("  switchboard help                           Show this message");
    println!();
    println!("Configuration is read from {} when present.", DEFAULT_CONFIG_PATH);
}
