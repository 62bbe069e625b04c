//! Logging, tracing and metrics setup

#[cfg(feature = "metrics")]
mod metrics;

#[cfg(feature = "telemetry")]
mod telemetry;

#[cfg(feature = "metrics")]
pub use metrics::{
    init_metrics, record_fetch, record_fetch_error, record_request, render_metrics,
};
#[cfg(feature = "telemetry")]
pub use telemetry::init_telemetry;

use crate::Result;
use crate::config::TelemetryConfig;

/// Initialize observability stack
pub fn init_observability(config: &TelemetryConfig) -> Result<()> {
    #[cfg(feature = "metrics")]
    {
        init_metrics()?;
    }

    #[cfg(feature = "telemetry")]
    {
        init_telemetry(config)?;
    }

    #[cfg(not(feature = "telemetry"))]
    {
        init_basic_logging(config)?;
    }

    Ok(())
}

/// Initialize logging without OpenTelemetry
#[cfg(not(feature = "telemetry"))]
fn init_basic_logging(config: &TelemetryConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer(config))
        .try_init()
        .map_err(|e| crate::Error::Config(format!("Failed to initialize logging: {e}")))
}

/// `RUST_LOG` when it parses, the configured level otherwise
fn env_filter(config: &TelemetryConfig) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

fn fmt_layer<S>(config: &TelemetryConfig) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    use tracing_subscriber::Layer;

    if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    }
}

/// Shutdown observability stack
#[allow(clippy::missing_const_for_fn)]
pub fn shutdown_observability() {
    #[cfg(feature = "telemetry")]
    {
        telemetry::shutdown_telemetry();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert!(config.otlp_endpoint.is_none());
        assert!(config.service_name.is_empty());
        assert!(config.log_level.is_empty());
        assert!(!config.json_logs);
    }

    #[test]
    fn test_env_filter_falls_back_to_level() {
        let config = TelemetryConfig {
            log_level: "warn".to_string(),
            ..TelemetryConfig::default()
        };
        // Parses whether or not RUST_LOG is set in the test environment
        let _filter = env_filter(&config);
    }

    #[test]
    fn test_shutdown_observability_no_panic() {
        shutdown_observability();
    }

    #[test]
    fn test_telemetry_config_debug_trait() {
        let config = TelemetryConfig::default();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("TelemetryConfig"));
    }
}
