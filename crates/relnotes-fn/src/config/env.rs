//! Environment variable loading for configuration

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use super::builder::{AuthMode, ConfigBuilder};
use crate::Result;
use crate::types::NullStyle;

/// Environment variable names
mod vars {
    pub const PROJECT_ID: &str = "PROJECT_ID";
    pub const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
    pub const BIGQUERY_EMULATOR_HOST: &str = "BIGQUERY_EMULATOR_HOST";
    pub const BIGQUERY_API_ENDPOINT: &str = "BIGQUERY_API_ENDPOINT";
    pub const GOOGLE_OAUTH_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
    pub const GCE_METADATA_HOST: &str = "GCE_METADATA_HOST";
    pub const RELNOTES_AUTH: &str = "RELNOTES_AUTH";
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
    pub const RELNOTES_REQUEST_TIMEOUT_SECS: &str = "RELNOTES_REQUEST_TIMEOUT_SECS";
    pub const RELNOTES_NULL_STYLE: &str = "RELNOTES_NULL_STYLE";
    pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const RELNOTES_JSON_LOGS: &str = "RELNOTES_JSON_LOGS";
}

/// Set and non-blank
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Project
    if let Some(project) = var(vars::PROJECT_ID).or_else(|| var(vars::GOOGLE_CLOUD_PROJECT)) {
        builder = builder.project_id(project);
    }

    // Engine: the emulator implies anonymous access, an explicit endpoint wins
    if let Some(host) = var(vars::BIGQUERY_EMULATOR_HOST) {
        let url = Url::parse(&format!("http://{host}")).map_err(|e| {
            crate::Error::Config(format!("Invalid {}: {}", vars::BIGQUERY_EMULATOR_HOST, e))
        })?;
        builder = builder.endpoint(url).auth_mode(AuthMode::None);
    }

    if let Some(endpoint) = var(vars::BIGQUERY_API_ENDPOINT) {
        let url = Url::parse(&endpoint).map_err(|e| {
            crate::Error::Config(format!("Invalid {}: {}", vars::BIGQUERY_API_ENDPOINT, e))
        })?;
        builder = builder.endpoint(url);
    }

    if let Some(token) = var(vars::GOOGLE_OAUTH_ACCESS_TOKEN) {
        builder = builder.access_token(token).auth_mode(AuthMode::Token);
    }

    if let Some(host) = var(vars::GCE_METADATA_HOST) {
        builder = builder.metadata_host(host);
    }

    if let Some(mode) = var(vars::RELNOTES_AUTH) {
        builder = builder.auth_mode(mode.parse()?);
    }

    // Transport
    if let Some(host_str) = var(vars::HOST)
        && let Ok(host) = host_str.parse::<IpAddr>()
    {
        builder = builder.http_host(host);
    }

    if let Some(port_str) = var(vars::PORT)
        && let Ok(port) = port_str.parse::<u16>()
    {
        builder = builder.http_port(port);
    }

    if let Some(timeout_str) = var(vars::RELNOTES_REQUEST_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    // Response
    if let Some(style) = var(vars::RELNOTES_NULL_STYLE) {
        builder = builder.null_style(style.parse::<NullStyle>()?);
    }

    // Telemetry
    if let Some(endpoint) = var(vars::OTEL_EXPORTER_OTLP_ENDPOINT) {
        builder = builder.otlp_endpoint(Some(endpoint));
    }

    if let Some(name) = var(vars::OTEL_SERVICE_NAME) {
        builder = builder.service_name(name);
    }

    if let Some(level) = var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Some(val) = var(vars::RELNOTES_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
