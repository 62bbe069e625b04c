//! OpenTelemetry initialization

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::{env_filter, fmt_layer};
use crate::config::TelemetryConfig;
use crate::{Error, Result};

static TRACER_PROVIDER: std::sync::OnceLock<SdkTracerProvider> = std::sync::OnceLock::new();

/// Initialize logging with an OTLP span exporter when an endpoint is set
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let registry = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer(config));

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        registry
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to initialize logging: {e}")))?;
        tracing::debug!("OpenTelemetry disabled (no endpoint configured)");
        return Ok(());
    };

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create OTLP exporter: {e}")))?;

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    let _ = TRACER_PROVIDER.set(provider);

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {e}")))?;

    tracing::info!("OpenTelemetry initialized with endpoint: {}", endpoint);
    Ok(())
}

/// Shutdown OpenTelemetry and flush pending traces
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        tracing::warn!("Failed to shutdown tracer provider: {e:?}");
    }
}
