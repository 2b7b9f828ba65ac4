//! xbgwd - XBee Gateway Daemon
//!
//! Bridges an XBee mesh to a remote management channel: command batches
//! arrive on `POST /do_command`, radio telemetry is published on the
//! telemetry bus.
//!
//! Usage:
//!   xbgwd [OPTIONS] [config.toml]
//!
//! If no config file is provided, uses mock sockets for demo purposes.

mod config;
mod server;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xbgw_command::{CommandRouter, EchoCommand};
use xbgw_core::{CommandBus, TelemetryBus};
use xbgw_xbee::{
    create_socket, DdoDescriptor, DdoManager, DestinationDescriptor, Reactor, XBeeSerialManager,
};

use crate::config::DaemonConfig;
use crate::server::{create_router, AppState};

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut result = Args { config_path: None };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"xbgwd - XBee Gateway Daemon

Usage: xbgwd [OPTIONS] [config.toml]

Options:
  -h, --help    Print this help message

Examples:
  # Run with mock sockets
  xbgwd

  # Run with config file
  xbgwd xbgwd.toml

  # Send a command batch
  curl -d '<send_serial addr="00:13:a2:00:40:0a:12:34">aGVsbG8=</send_serial>' \
       http://localhost:18090/do_command
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "xbgwd=info,xbgw_xbee=debug,xbgw_command=info,xbgw_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting xbgwd (XBee Gateway Daemon)");

    let args = parse_args();

    let config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        DaemonConfig::load(path)?
    } else {
        tracing::info!("No config file provided, using mock sockets");
        DaemonConfig::default()
    };

    let commands = Arc::new(CommandBus::new());
    let telemetry_bus = Arc::new(TelemetryBus::new());

    if config.debug.log_telemetry {
        telemetry::register_log_sink(&telemetry_bus);
    }
    if config.debug.echo {
        EchoCommand::with_delay(Duration::from_millis(config.debug.echo_delay_ms))
            .register(&commands);
        tracing::info!(delay_ms = config.debug.echo_delay_ms, "Registered echo command");
    }

    // Radio managers
    let serial_socket = create_socket::<DestinationDescriptor>(&config.xbee.transport)?;
    let serial = Arc::new(XBeeSerialManager::new(
        serial_socket,
        &config.xbee,
        telemetry_bus.clone(),
    ));
    serial.register(&commands);

    let ddo_socket = create_socket::<DdoDescriptor>(&config.ddo.transport)?;
    let ddo = Arc::new(DdoManager::new(ddo_socket, &config.ddo));
    ddo.register(&commands);

    tracing::info!(topics = ?commands.topics(), "Command handlers registered");

    let mut reactor = Reactor::new(&config.reactor);
    reactor.register(serial);
    reactor.register(ddo);
    let reactor = reactor.spawn()?;

    let router = CommandRouter::new(commands)
        .with_response_timeout(Duration::from_secs(config.command.response_timeout_secs));
    let app = create_router(AppState::new(router));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    reactor.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
