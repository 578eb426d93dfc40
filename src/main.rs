mod commands;
mod logging;

use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use dewey::config::{self, AppConfig};
use dewey::naming::OpenAiOracle;
use dewey::{InputWatcher, RealFs, ShutdownHandle};
use dotenv::dotenv;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    match args.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            let mut watcher = match build_watcher(&config) {
                Ok(watcher) => watcher,
                Err(err) => {
                    error!("Error: {}", err);
                    drop(guard);
                    process::exit(1);
                }
            };

            tokio::spawn(stop_on_signal(watcher.shutdown_handle()));
            watcher.watch().await;
            info!("Shutdown complete");
        }
        Commands::CheckConfig => {
            print_config(&config);
            if let Err(err) = config.require_openai() {
                error!("Error: {}", err);
                drop(guard);
                process::exit(1);
            }
        }
    }

    Ok(())
}

fn build_watcher(config: &AppConfig) -> Result<InputWatcher, dewey::Error> {
    let oracle = OpenAiOracle::new(config.require_openai()?.clone())?;
    Ok(InputWatcher::new(
        Arc::new(config.watch.clone()),
        Arc::new(RealFs::new()),
        Arc::new(oracle),
    ))
}

async fn stop_on_signal(shutdown: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
    shutdown.stop();
}

fn print_config(config: &AppConfig) {
    let watch = &config.watch;
    info!("Input dir: {}", watch.input_dir.display().to_string().green());
    info!("Output dir: {}", watch.output_dir.display().to_string().green());
    info!(
        "Stale time: {}, poll interval: {}",
        format!("{}ms", watch.stale_time.as_millis()).cyan(),
        format!("{}ms", watch.poll_interval.as_millis()).cyan(),
    );
    info!("Naming mode: {:?}", watch.naming_mode);
    info!(
        "Ignore patterns: {:?}",
        watch
            .ignore_patterns
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
    );
    info!("Remove empty source dirs: {}", watch.remove_empty_source);
    match &config.openai {
        Some(openai) => info!(
            "Naming oracle: {} at {}",
            openai.model.cyan(),
            openai.base_url
        ),
        None => info!("Naming oracle: {}", "OPENAI_API_KEY not set".red()),
    }
}
