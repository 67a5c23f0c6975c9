//! Valet - local service monitor daemon
//! Watches system services and publishes status/log events for the UI

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use valet_core::application::{shutdown_channel, AdaptiveScheduler, ServiceControl};
use valet_core::domain::Platform;
use valet_core::port::{
    emit_serialized, CompositeEventSink, EventSink, SystemTimeProvider, EVENT_STATUS_CHANGED,
};
use valet_infra_system::{default_probe, JsonLinesEventSink, TracingEventSink};

use crate::settings::{EventOutput, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (stderr; stdout may carry the event stream)
    let log_format = std::env::var("VALET_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("valet=info"))
        .context("Failed to create env filter")?;

    // Optional OpenTelemetry export
    let (otel, telemetry_status) = telemetry::otel_layer()?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(otel)
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(otel)
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    info!("Valet v{} starting...", VERSION);
    telemetry_status.log();

    // 2. Load configuration
    let settings = Settings::load()?;
    let platform = Platform::current();
    let catalog = settings.catalog()?;
    let services = settings.watch_list(&catalog, platform)?;
    info!(
        platform = %platform,
        services = ?services.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        "Watch list resolved"
    );

    // 3. Setup dependencies (DI wiring)
    let probe = default_probe(settings.command_timeout())
        .context("No service manager available on this platform")?;
    let sink: Arc<dyn EventSink> = match settings.event_output {
        EventOutput::Log => Arc::new(TracingEventSink),
        EventOutput::Stdout => Arc::new(CompositeEventSink::new(vec![
            Arc::new(JsonLinesEventSink::stdout().context("Failed to start event writer")?),
            Arc::new(TracingEventSink),
        ])),
    };
    let time_provider = Arc::new(SystemTimeProvider);

    // 4. Initial load for the UI
    if settings.announce_initial_status {
        let control = ServiceControl::new(probe.clone(), sink.clone(), time_provider.clone());
        for status in control.all_statuses(&services).await {
            emit_serialized(sink.as_ref(), EVENT_STATUS_CHANGED, &status);
        }
    }

    // 5. Start the monitor
    let mut monitor = AdaptiveScheduler::new(
        services,
        probe,
        sink,
        time_provider,
        settings.monitor_config(),
    )?;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let monitor_handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    match tokio::time::timeout(SHUTDOWN_GRACE, monitor_handle).await {
        Ok(Ok(exit)) => info!(rounds = exit.rounds, "Monitor stopped"),
        Ok(Err(e)) => error!(error = ?e, "Monitor task failed"),
        Err(_) => warn!("Monitor did not stop within the grace period"),
    }

    info!("Shutdown complete.");
    Ok(())
}
