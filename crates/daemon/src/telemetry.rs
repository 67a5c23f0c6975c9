//! OpenTelemetry trace export (optional)
//!
//! Enabled by building with `--features telemetry` and setting
//! `OTEL_EXPORTER_OTLP_ENDPOINT`. The returned layer sits directly on the
//! registry so it composes with the fmt layer instead of replacing it.
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//! OTEL_SERVICE_NAME=valet-dev \
//!     ./valet
//! ```

use anyhow::Result;
#[cfg(feature = "telemetry")]
use tracing_subscriber::Registry;

#[cfg(feature = "telemetry")]
pub type OtelLayer =
    tracing_opentelemetry::OpenTelemetryLayer<Registry, opentelemetry_sdk::trace::Tracer>;

#[cfg(not(feature = "telemetry"))]
pub type OtelLayer = tracing_subscriber::layer::Identity;

/// What happened to trace export, logged once the subscriber is up
#[derive(Debug, PartialEq, Eq)]
pub enum TelemetryStatus {
    Disabled,
    #[cfg(feature = "telemetry")]
    Enabled { endpoint: String },
    #[cfg(not(feature = "telemetry"))]
    FeatureMissing,
}

/// Build the export layer, if configured
///
/// Runs before the subscriber exists, so it reports through the returned
/// status instead of logging.
pub fn otel_layer() -> Result<(Option<OtelLayer>, TelemetryStatus)> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok((None, TelemetryStatus::Disabled));
    };

    #[cfg(feature = "telemetry")]
    {
        let layer = build_layer(&endpoint)?;
        Ok((Some(layer), TelemetryStatus::Enabled { endpoint }))
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = endpoint;
        Ok((None, TelemetryStatus::FeatureMissing))
    }
}

#[cfg(feature = "telemetry")]
fn build_layer(endpoint: &str) -> Result<OtelLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "valet".to_string());

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();
    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

impl TelemetryStatus {
    pub fn log(&self) {
        match self {
            TelemetryStatus::Disabled => {
                tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)")
            }
            #[cfg(feature = "telemetry")]
            TelemetryStatus::Enabled { endpoint } => {
                tracing::info!(endpoint = %endpoint, "OpenTelemetry export enabled")
            }
            #[cfg(not(feature = "telemetry"))]
            TelemetryStatus::FeatureMissing => {
                tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
                tracing::warn!("Rebuild with: cargo build --features telemetry");
            }
        }
    }
}
