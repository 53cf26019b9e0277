mod api;
mod bootstrap;
mod health;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use gtmscout_agent::runtime::AgentRuntime;
use gtmscout_core::config::{AppConfig, LoadOptions};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const MAX_SWEEP_PERIOD_SECS: u64 = 60;

fn init_logging(config: &AppConfig) {
    use gtmscout_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let router = Router::new()
        .merge(health::router(app.runtime.memory_configured()))
        .merge(api::router(app.runtime.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        bind_address = %address,
        memory_configured = app.runtime.memory_configured(),
        "gtmscout-server listening"
    );

    let sweeper = spawn_idle_sweeper(app.runtime.clone(), app.config.server.session_idle_secs);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        finished = &mut server => {
            finished??;
            return Ok(());
        }
        signal = wait_for_shutdown() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        thread_id = "unknown",
        sessions = app.runtime.registry().len().await,
        "gtmscout-server stopping"
    );
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    let _ = shutdown_tx.send(());

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(finished) => finished??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            thread_id = "unknown",
            grace_secs = app.config.server.graceful_shutdown_secs,
            "in-flight requests did not drain before the grace period elapsed"
        ),
    }

    Ok(())
}

fn spawn_idle_sweeper(runtime: Arc<AgentRuntime>, idle_secs: u64) -> Option<JoinHandle<()>> {
    if idle_secs == 0 {
        return None;
    }
    let idle = Duration::from_secs(idle_secs);
    let period = Duration::from_secs(idle_secs.clamp(1, MAX_SWEEP_PERIOD_SECS));

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = runtime.evict_idle_sessions(idle).await;
            if evicted > 0 {
                info!(
                    event_name = "system.sessions.evicted",
                    correlation_id = "sweeper",
                    thread_id = "unknown",
                    evicted,
                    idle_secs,
                    "evicted idle sessions"
                );
            }
        }
    }))
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
