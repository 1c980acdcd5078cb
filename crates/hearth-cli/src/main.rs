//! # hearth
//!
//! Terminal client for the hearth smart-home dashboard backend: chat with
//! the agent, watch devices and system health, manage threads.

#![deny(unsafe_code)]

mod chat;
mod devices;
mod notify;
mod threads;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hearth_api::ApiClient;
use hearth_chat::{ChatStreamClient, SessionStore};
use hearth_settings::HearthSettings;

/// Terminal client for the hearth smart-home dashboard.
#[derive(Parser, Debug)]
#[command(name = "hearth", about = "Terminal client for the hearth smart-home dashboard")]
struct Cli {
    /// Backend base URL (overrides settings).
    #[arg(long)]
    base_url: Option<String>,

    /// Path to the settings file (default `~/.hearth/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Converse with the agent.
    Chat {
        /// Thread to continue; a new thread is created when absent.
        #[arg(long)]
        thread: Option<String>,
        /// Model to request for each turn.
        #[arg(long)]
        model: Option<String>,
    },
    /// Show the device list, or watch it for transitions.
    Devices {
        /// Keep watching and print notifications as devices change.
        #[arg(long)]
        watch: bool,
    },
    /// Show system health, or watch it for edges.
    Health {
        /// Keep watching and print notifications on health edges.
        #[arg(long)]
        watch: bool,
    },
    /// Manage conversation threads.
    Threads {
        #[command(subcommand)]
        command: threads::ThreadsCommand,
    },
}

/// Everything a subcommand needs, wired once at startup.
struct App {
    settings: HearthSettings,
    api: ApiClient,
    session: Arc<SessionStore>,
}

fn build_app(cli: &Cli) -> Result<App> {
    let mut settings = match &cli.settings {
        Some(path) => hearth_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => hearth_settings::load_settings().context("failed to load settings")?,
    };
    if let Some(base_url) = &cli.base_url {
        settings.api.base_url = base_url.clone();
    }

    hearth_core::logging::init_subscriber(&settings.logging.level);

    // CRUD calls get a request timeout; the streaming clients run unbounded
    // and rely on idle timeouts instead
    let crud_http = reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.api.request_timeout_ms))
        .build()
        .context("failed to build HTTP client")?;
    let api = ApiClient::from_parts(crud_http, settings.api.base_url.clone());

    let stream = ChatStreamClient::from_parts(
        reqwest::Client::new(),
        settings.api.base_url.clone(),
        settings.stream.idle_timeout_ms,
    );
    let notifier = Arc::new(notify::StderrNotifier);
    let session = Arc::new(SessionStore::new(
        Arc::new(stream),
        Arc::new(api.clone()),
        notifier,
    ));

    Ok(App {
        settings,
        api,
        session,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = build_app(&cli)?;

    match cli.command {
        Command::Chat { thread, model } => chat::run(&app, thread, model).await,
        Command::Devices { watch } => devices::devices(&app, watch).await,
        Command::Health { watch } => devices::health(&app, watch).await,
        Command::Threads { command } => threads::run(&app.api, command).await,
    }
}
