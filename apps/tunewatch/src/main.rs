mod config;
mod display;

use anyhow::Result;
use clap::Parser;
use config::AppConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunewatch_core::{MediaPlayerState, MusicConnector};
use tunewatch_media_session::{create_connector, Backend, ShutdownSignal};

/// Print what the system media session is playing
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to <config dir>/tunewatch/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the state once and exit
    #[arg(long)]
    once: bool,

    /// Print JSON lines
    #[arg(long)]
    json: bool,

    /// How often to re-read the state, in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Use the dummy connector regardless of platform
    #[arg(long)]
    dummy: bool,

    /// Also write logs to a daily rotated file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    let mut config = AppConfig::load(args.config.as_deref())?;
    if args.dummy {
        config.connector.backend = Backend::Dummy;
    }
    if args.json {
        config.display.json = true;
    }
    if let Some(refresh_ms) = args.refresh_ms {
        config.display.refresh_ms = refresh_ms;
    }

    tracing::info!("Starting tunewatch");

    let shutdown = ShutdownSignal::new();
    let connector = create_connector(&config.connector, shutdown.clone());
    let refresh = Duration::from_millis(config.display.refresh_ms.max(50));

    if args.once {
        // Give the connector one refresh interval to publish something
        tokio::time::sleep(refresh).await;
        print_state(&connector.get_state(), config.display.json)?;
        shutdown.request();
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(refresh);
    let mut last: Option<MediaPlayerState> = None;

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            _ = ticker.tick() => {
                let state = connector.get_state();
                if display::should_print(last.as_ref(), &state) {
                    print_state(&state, config.display.json)?;
                }
                last = Some(state);
            }
        }
    }

    tracing::info!("Shutting down");
    shutdown.request();
    Ok(())
}

fn print_state(state: &MediaPlayerState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        println!("{}", display::format_line(state));
    }
    Ok(())
}

/// Log to stderr (stdout carries the output), optionally also to a file
fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tunewatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tunewatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
