//! # Hit & Run Panda
//!
//! A desktop reminder agent. Every so often a panda runs onto the screen,
//! asks whether you did the thing you meant to do, writes down the answer,
//! and runs off again. A separate, louder red alert can fire on its own
//! interval.
//!
//! Only one instance runs per user session. Invoking the binary again with
//! a command forwards that command to the running instance.

mod app;
mod channel;
mod config;
pub mod constants;
mod error;
mod history;
mod lifecycle;
mod notifications;
mod scheduler;
mod ui;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use tokio::time::Instant;

use app::App;
use channel::{ChannelServer, Command};
use config::ConfigStore;
use error::PandaError;
use ui::TerminalPresenter;

/// Hit & Run Panda - a reminder agent that will not let you forget
#[derive(Parser, Debug)]
#[command(name = "panda", version, about = "A desktop reminder agent")]
struct Cli {
    /// Command for the running instance; with none, start the agent
    #[arg(value_enum)]
    command: Option<Command>,

    /// Directory holding settings.json and history.json
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Command channel socket path
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Optional path overrides; missing file is fine.
    let _ = dotenvy::from_path(constants::env_file_path());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let socket = cli.socket.unwrap_or_else(constants::socket_path);

    if let Some(command) = cli.command {
        return Ok(deliver(&socket, command).await);
    }

    let server = match ChannelServer::bind(&socket).await {
        Ok(server) => server,
        Err(PandaError::ChannelBind(_)) => {
            info!("{} is already running; asking it to show a reminder", constants::APP_NAME);
            return Ok(deliver(&socket, Command::Show).await);
        }
        Err(e) => return Err(e.into()),
    };

    let store = match cli.config_dir {
        Some(dir) => ConfigStore::new(dir),
        None => ConfigStore::open_default(),
    };
    let settings = store.load();
    info!(
        "{} started (settings: {}, history: {})",
        constants::APP_NAME,
        store.settings_path().display(),
        store.history().path().display()
    );

    let presenter = TerminalPresenter::new(store.clone());
    let mut app = App::new(store, settings, Box::new(presenter));
    let _server_task = server.spawn(app.events());

    app.start(Instant::now());
    app.run(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    info!("{} stopped", constants::APP_NAME);
    Ok(ExitCode::SUCCESS)
}

/// Client mode: hand `command` to the running instance.
async fn deliver(socket: &std::path::Path, command: Command) -> ExitCode {
    match channel::send_command(socket, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(PandaError::ChannelTimeout(_)) => {
            eprintln!("{} is not running.", constants::APP_NAME);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Could not reach {}: {}", constants::APP_NAME, e);
            ExitCode::FAILURE
        }
    }
}
