//! Configuration builder

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use relnotes_bigquery::auth::DEFAULT_METADATA_HOST;
use relnotes_bigquery::{ClientOptions, Credentials, default_endpoint};
use url::Url;

use crate::types::NullStyle;
use crate::{Error, Result};

/// Function configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Billing project for query jobs; checked per request, not at startup
    pub project_id: Option<String>,
    pub engine: EngineConfig,
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
    pub response: ResponseConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

/// How requests to BigQuery are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Service account token from the instance metadata server
    #[default]
    Metadata,
    /// Pre-minted access token
    Token,
    /// No credentials (emulators)
    None,
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metadata" | "adc" => Ok(Self::Metadata),
            "token" => Ok(Self::Token),
            "none" | "anonymous" => Ok(Self::None),
            other => Err(Error::Config(format!(
                "Invalid auth mode '{other}' (expected metadata, token or none)"
            ))),
        }
    }
}

/// BigQuery endpoint and credentials
#[derive(Clone)]
pub struct EngineConfig {
    pub endpoint: Url,
    pub auth: AuthMode,
    pub access_token: Option<String>,
    pub metadata_host: String,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth", &self.auth)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("metadata_host", &self.metadata_host)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auth: AuthMode::Metadata,
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

impl EngineConfig {
    /// Credential source for the configured auth mode.
    pub fn credentials(&self) -> Result<Credentials> {
        match self.auth {
            AuthMode::Metadata => Ok(Credentials::MetadataServer {
                host: self.metadata_host.clone(),
            }),
            AuthMode::Token => self
                .access_token
                .clone()
                .filter(|t| !t.is_empty())
                .map(Credentials::Token)
                .ok_or_else(|| Error::Config("auth mode 'token' requires an access token".into())),
            AuthMode::None => Ok(Credentials::Anonymous),
        }
    }

    pub fn client_options(&self) -> Result<ClientOptions> {
        Ok(ClientOptions::new(self.endpoint.clone(), &self.credentials()?))
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub http_host: IpAddr,
    pub http_port: u16,
    /// Deadline for one request, engine work included
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 8080,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

/// Response rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseConfig {
    pub null_style: NullStyle,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    project_id: Option<String>,
    engine: EngineConfig,
    transport: TransportConfig,
    telemetry: TelemetryConfig,
    response: ResponseConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            project_id: None,
            engine: EngineConfig::default(),
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig {
                otlp_endpoint: None,
                service_name: env!("CARGO_PKG_NAME").to_string(),
                log_level: "info".to_string(),
                json_logs: false,
            },
            response: ResponseConfig::default(),
        }
    }

    #[must_use]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.engine.endpoint = endpoint;
        self
    }

    #[must_use]
    pub const fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.engine.auth = mode;
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.engine.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn metadata_host(mut self, host: impl Into<String>) -> Self {
        self.engine.metadata_host = host.into();
        self
    }

    #[must_use]
    pub const fn http_host(mut self, host: IpAddr) -> Self {
        self.transport.http_host = host;
        self
    }

    #[must_use]
    pub const fn http_port(mut self, port: u16) -> Self {
        self.transport.http_port = port;
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn otlp_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.telemetry.otlp_endpoint = endpoint;
        self
    }

    #[must_use]
    pub fn service_name(mut self, name: String) -> Self {
        self.telemetry.service_name = name;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    #[must_use]
    pub const fn null_style(mut self, style: NullStyle) -> Self {
        self.response.null_style = style;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.transport.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be non-zero".into()));
        }
        // Surfaces a token mode without a token at startup
        self.engine.credentials()?;

        Ok(Config {
            project_id: self
                .project_id
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            engine: self.engine,
            transport: self.transport,
            telemetry: self.telemetry,
            response: self.response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(config.project_id().is_none());
        assert_eq!(config.engine.endpoint.as_str(), "https://bigquery.googleapis.com/");
        assert_eq!(config.engine.auth, AuthMode::Metadata);
        assert_eq!(config.transport.http_host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.transport.http_port, 8080);
        assert_eq!(config.transport.request_timeout, Duration::from_secs(60));
        assert_eq!(config.telemetry.service_name, "relnotes-fn");
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.response.null_style, NullStyle::Sentinel);
    }

    #[test]
    fn test_builder_fluent() {
        let config = ConfigBuilder::new()
            .project_id("my-project")
            .endpoint(Url::parse("http://localhost:9050").unwrap())
            .auth_mode(AuthMode::None)
            .http_port(9000)
            .request_timeout(Duration::from_secs(5))
            .json_logs(true)
            .null_style(NullStyle::JsonNull)
            .build()
            .unwrap();

        assert_eq!(config.project_id(), Some("my-project"));
        assert_eq!(config.engine.endpoint.as_str(), "http://localhost:9050/");
        assert_eq!(config.transport.http_port, 9000);
        assert!(config.telemetry.json_logs);
        assert_eq!(config.response.null_style, NullStyle::JsonNull);
    }

    #[test]
    fn test_blank_project_is_unset() {
        let config = ConfigBuilder::new().project_id("   ").build().unwrap();
        assert!(config.project_id().is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ConfigBuilder::new()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_token_mode_requires_token() {
        let err = ConfigBuilder::new()
            .auth_mode(AuthMode::Token)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("access token"));

        let config = ConfigBuilder::new()
            .auth_mode(AuthMode::Token)
            .access_token("ya29.x")
            .build()
            .unwrap();
        assert_eq!(
            config.engine.credentials().unwrap(),
            Credentials::Token("ya29.x".into())
        );
    }

    #[test]
    fn test_metadata_credentials_use_host() {
        let config = ConfigBuilder::new()
            .metadata_host("169.254.169.254")
            .build()
            .unwrap();
        assert_eq!(
            config.engine.credentials().unwrap(),
            Credentials::MetadataServer {
                host: "169.254.169.254".into()
            }
        );
    }

    #[test]
    fn test_auth_mode_parse() {
        assert_eq!("metadata".parse::<AuthMode>().unwrap(), AuthMode::Metadata);
        assert_eq!("TOKEN".parse::<AuthMode>().unwrap(), AuthMode::Token);
        assert_eq!("anonymous".parse::<AuthMode>().unwrap(), AuthMode::None);
        assert!("kerberos".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_engine_debug_redacts_token() {
        let config = ConfigBuilder::new()
            .auth_mode(AuthMode::Token)
            .access_token("secret-token")
            .build()
            .unwrap();
        let debug_str = format!("{:?}", config.engine);
        assert!(!debug_str.contains("secret-token"));
    }
}
