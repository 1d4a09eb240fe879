//! thanos-hub - Main entry point
//!
//! Connects to the MQTT broker, runs the liveness monitor and serves the
//! HTTP API until Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use thanos_common::events::EventBus;
use thanos_hub::api::{self, AppContext};
use thanos_hub::config::{CliOverrides, HubConfig};
use thanos_hub::controller::{Controller, LivenessMonitor, StateStore};
use thanos_hub::shutdown;
use thanos_hub::transport::mqtt::{self, InboundLoop, MqttCommandSink};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity of the SSE event channel
const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for thanos-hub
#[derive(Parser, Debug)]
#[command(name = "thanos-hub")]
#[command(about = "Clap-controlled LED hub")]
#[command(version)]
struct Args {
    /// Path to config file (overrides THANOS_CONFIG and default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long, env = "THANOS_MQTT_HOST")]
    mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "THANOS_MQTT_PORT")]
    mqtt_port: Option<u16>,

    /// HTTP port to listen on
    #[arg(short, long, env = "THANOS_HTTP_PORT")]
    port: Option<u16>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            mqtt_host: args.mqtt_host,
            mqtt_port: args.mqtt_port,
            http_port: args.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config supplies the default log level, so it loads before tracing is up;
    // log_summary below reports what was loaded
    let config = HubConfig::load(&args.into()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.file.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Thanos hub (thanos-hub) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config.log_summary();

    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let store = Arc::new(StateStore::new(config.store_settings()));

    let (client, eventloop) = mqtt::connect(&config.file.mqtt);
    let sink = Arc::new(MqttCommandSink::new(
        client.clone(),
        config.file.mqtt.topics.led_control.clone(),
    ));
    let controller = Arc::new(Controller::new(
        Arc::clone(&store),
        sink,
        config.file.mqtt.topics.clone(),
        events.clone(),
    ));

    let cancel = CancellationToken::new();

    let inbound = InboundLoop::new(
        client,
        eventloop,
        Arc::clone(&controller),
        &config.file.mqtt,
        cancel.child_token(),
    );
    let mqtt_task = tokio::spawn(inbound.run());

    let monitor = LivenessMonitor::new(
        store,
        events,
        config.liveness_interval(),
        cancel.child_token(),
    );
    let monitor_task = tokio::spawn(monitor.run());

    // Signal listener cancels everything, including the HTTP server
    let signal_task = tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    let ctx = AppContext { controller };
    let served = api::run(&config.file.http, ctx, cancel.child_token()).await;

    // Server may also exit on its own (bind failure); stop the background tasks
    cancel.cancel();
    for (name, task) in [
        ("MQTT loop", mqtt_task),
        ("liveness monitor", monitor_task),
        ("signal listener", signal_task),
    ] {
        if let Err(e) = task.await {
            error!("{} task failed: {}", name, e);
        }
    }

    served.context("HTTP server failed")?;
    info!("Shutdown complete");
    Ok(())
}
