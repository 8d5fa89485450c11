use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use mechdesk::api::{ApiClient, ApiResponse, FileTokenStore};
use mechdesk::config::Config;
use mechdesk::console;
use mechdesk::models::{
    fetch_rows, load_detail, AdminResource, AuditLog, ChatSession, Feedback, Mechanic, Resource,
    ResourceGateway, ServiceRequest, User, Vehicle,
};
use mechdesk::report::{render_detail, render_list, ListOptions};

mod cli;

use cli::{Cli, Commands};

const LOG_FILE: &str = "mechdesk.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "mechdesk=info");
    }
    init_logging(interactive)?;

    let config = Config::from_env()?;
    config.validate()?;

    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let client = ApiClient::new(&config, tokens).context("Failed to build HTTP client")?;

    let Some(command) = cli.command.filter(|_| !interactive) else {
        info!("Launching console against {}", client.base_url());
        if let Err(e) = console::run(config, client).await {
            error!("Console failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    };

    match &command {
        Commands::Login { username, password } => {
            client.login(username, password).await?;
            println!("Signed in as {}", username);
        }

        Commands::Logout => {
            client.logout()?;
            println!("Signed out");
        }

        Commands::List { resource, .. } => {
            let options = command.list_options().unwrap_or_default();
            let output = list_resource(&client, *resource, &options).await?;
            println!("{}", output);
        }

        Commands::Get { endpoint } => {
            let response = ApiResponse::from_result(client.get::<Value>(endpoint).await);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_ok() {
                std::process::exit(1);
            }
        }

        Commands::Show { resource, id } => {
            let (title, requests) = match id {
                Some(id) => (format!("{} {}", resource.noun(), id), resource.detail_requests(id)),
                None => (format!("{} summary", resource.title()), resource.summary_requests()),
            };
            if requests.is_empty() {
                anyhow::bail!(
                    "{} has no {}",
                    resource.title(),
                    if id.is_some() { "detail view" } else { "summary" }
                );
            }
            let detail = load_detail(&client, title, requests)
                .await
                .with_context(|| format!("Failed to load {}", resource.title()))?;
            println!("{}", render_detail(&detail));
        }

        Commands::Delete { resource, id, yes } => {
            if !resource.can_delete() {
                anyhow::bail!("{} cannot be deleted", resource.title());
            }
            if !yes && !confirm(&format!("Delete {} {}? [y/N] ", resource.noun(), id))? {
                println!("Cancelled");
                return Ok(());
            }
            client.remove(*resource, id).await?;
            info!("Deleted {} {}", resource.noun(), id);
            println!("{} deleted", resource.noun());
        }

        Commands::Tui => {}
    }

    Ok(())
}

/// The console owns the terminal, so it logs to the file only. Commands log
/// to stderr as well.
fn init_logging(interactive: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    if interactive {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)
            .with_context(|| format!("Cannot open log file {}", LOG_FILE))?;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(log_file)
            .with_ansi(false)
            .init();
        return Ok(());
    }

    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
    Ok(())
}

async fn list_resource(client: &ApiClient, resource: Resource, options: &ListOptions) -> Result<String> {
    match resource {
        Resource::Users => list_rows::<User>(client, options).await,
        Resource::Mechanics => list_rows::<Mechanic>(client, options).await,
        Resource::Vehicles => list_rows::<Vehicle>(client, options).await,
        Resource::Services => list_rows::<ServiceRequest>(client, options).await,
        Resource::Feedback => list_rows::<Feedback>(client, options).await,
        Resource::Chats => list_rows::<ChatSession>(client, options).await,
        Resource::Audit => list_rows::<AuditLog>(client, options).await,
    }
}

async fn list_rows<R: AdminResource>(client: &ApiClient, options: &ListOptions) -> Result<String> {
    let rows = fetch_rows::<R, _>(client)
        .await
        .with_context(|| format!("Failed to load {}", R::RESOURCE.title()))?;
    info!("Fetched {} {}", rows.len(), R::RESOURCE);
    Ok(render_list(&R::columns(), &rows, options)?)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
