//! Weather Station
//!
//! Connects to the bridge daemon and keeps the display updated until a line
//! is entered on stdin or the process is interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use weather_station::{Station, StationConfig, TinkerforgeBridge};

/// Weather Station display driver
#[derive(Parser, Debug)]
#[command(name = "weather-station")]
#[command(about = "Weather Station display driver", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "weather-station.toml")]
    config: PathBuf,

    /// Bridge daemon host
    #[arg(long)]
    host: Option<String>,

    /// Bridge daemon port
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async_main());

    // A stdin read still in flight must not hold up the exit
    runtime.shutdown_background();
    result
}

async fn async_main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("weather_station=info,tfp=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = StationConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Weather Station: Start");

    let bridge = Arc::new(TinkerforgeBridge::new(config.connection_config()));
    let station = Station::new(bridge, &config);

    let startup = tokio::spawn({
        let station = station.clone();
        async move {
            if let Err(e) = station.start().await {
                error!("Failed to start: {}", e);
            }
        }
    });

    println!("Press key to exit");
    wait_for_exit().await;
    startup.abort();

    if let Err(e) = station.shutdown().await {
        warn!("Disconnect failed: {}", e);
    }

    info!("Weather Station: End");
    Ok(())
}

/// Resolve on a line from stdin, Ctrl+C or SIGTERM. A closed stdin leaves
/// only the signals.
async fn wait_for_exit() {
    let stdin = async {
        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(n) if n > 0 => {}
            _ => std::future::pending::<()>().await,
        }
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = stdin => {}
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
