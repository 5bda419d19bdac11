//! # rawhttp - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0: configuración desde CLI/env,
//! registro de comandos, señales del sistema operativo y apagado ordenado.

use clap::Parser;
use rawhttp::commands;
use rawhttp::config::Config;
use rawhttp::metrics::ServerStats;
use rawhttp::router::Router;
use rawhttp::server::{Server, ShutdownHandle};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rawhttp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }
    config.log_summary();

    let stats = Arc::new(ServerStats::new());
    let mut router = Router::new();
    commands::register(&mut router, config.data_dir.clone(), Arc::clone(&stats));

    let grace = config.shutdown_grace();
    let mut server = Server::with_stats(config, router, Arc::clone(&stats));

    if let Err(e) = server.bind() {
        tracing::error!(error = %e, "Error starting server");
        return ExitCode::FAILURE;
    }
    spawn_signal_listener(server.shutdown_handle());

    let result = server.serve();

    // Las conexiones en curso terminan solas; se les da un plazo
    if !stats.wait_for_idle(grace) {
        tracing::warn!(
            active_connections = stats.active_connections(),
            "Grace period elapsed with connections in flight"
        );
    }

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

/// Espera SIGINT/SIGTERM en un thread propio y apaga el servidor
fn spawn_signal_listener(handle: ShutdownHandle) {
    let spawned = thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start signal runtime");
                    return;
                }
            };

            match runtime.block_on(shutdown_signal()) {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    handle.shutdown();
                }
                Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
            }
        });

    if let Err(e) = spawned {
        tracing::error!(error = %e, "Failed to spawn signal thread");
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> io::Result<()> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<()> {
    signal::ctrl_c().await
}
