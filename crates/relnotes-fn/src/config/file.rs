//! TOML configuration file loading

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::{AuthMode, ConfigBuilder};
use crate::Result;
use crate::types::NullStyle;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./relnotes.toml",
    "~/.config/relnotes/config.toml",
    "/etc/relnotes/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(project) = config.project_id {
        builder = builder.project_id(project);
    }

    // Engine settings
    if let Some(engine) = config.engine {
        if let Some(url_str) = engine.endpoint {
            let url = Url::parse(&url_str)
                .map_err(|e| crate::Error::Config(format!("Invalid engine endpoint: {e}")))?;
            builder = builder.endpoint(url);
        }

        if let Some(token) = engine.access_token {
            builder = builder.access_token(token).auth_mode(AuthMode::Token);
        }

        if let Some(host) = engine.metadata_host {
            builder = builder.metadata_host(host);
        }

        if let Some(mode) = engine.auth {
            builder = builder.auth_mode(mode.parse()?);
        }
    }

    // Transport settings
    if let Some(transport) = config.transport {
        if let Some(host_str) = transport.http_host
            && let Ok(host) = host_str.parse::<IpAddr>()
        {
            builder = builder.http_host(host);
        }

        if let Some(port) = transport.http_port {
            builder = builder.http_port(port);
        }

        if let Some(timeout) = transport.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(timeout));
        }
    }

    // Response settings
    if let Some(response) = config.response
        && let Some(style) = response.null_style
    {
        builder = builder.null_style(style.parse::<NullStyle>()?);
    }

    // Observability settings
    if let Some(obs) = config.observability {
        if let Some(endpoint) = obs.otlp_endpoint {
            builder = builder.otlp_endpoint(Some(endpoint));
        }

        if let Some(name) = obs.service_name {
            builder = builder.service_name(name);
        }

        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    project_id: Option<String>,
    engine: Option<EngineFileConfig>,
    transport: Option<TransportFileConfig>,
    response: Option<ResponseFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct EngineFileConfig {
    endpoint: Option<String>,
    auth: Option<String>,
    access_token: Option<String>,
    metadata_host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransportFileConfig {
    http_host: Option<String>,
    http_port: Option<u16>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResponseFileConfig {
    null_style: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    otlp_endpoint: Option<String>,
    service_name: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
project_id = "my-project"

[engine]
endpoint = "http://localhost:9050"
auth = "none"

[transport]
http_host = "127.0.0.1"
http_port = 9090
request_timeout_secs = 20

[response]
null_style = "null"

[observability]
otlp_endpoint = "http://localhost:4317"
service_name = "relnotes-test"
log_level = "debug"
json_logs = true
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.project_id.as_deref(), Some("my-project"));
        assert!(config.engine.is_some());
        assert!(config.transport.is_some());
        assert!(config.response.is_some());
        assert!(config.observability.is_some());

        let transport = config.transport.unwrap();
        assert_eq!(transport.http_port, Some(9090));
        assert_eq!(transport.request_timeout_secs, Some(20));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: FileConfig = toml::from_str(r#"project_id = "p""#).unwrap();
        assert!(config.engine.is_none());
        assert!(config.transport.is_none());
        assert!(config.observability.is_none());
    }

    #[test]
    fn test_load_from_file_success() {
        let toml_content = r#"
project_id = "file-project"

[engine]
endpoint = "http://localhost:9050"
auth = "none"

[transport]
http_port = 9191

[response]
null_style = "null"
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.project_id(), Some("file-project"));
        assert_eq!(config.engine.endpoint.as_str(), "http://localhost:9050/");
        assert_eq!(config.engine.auth, AuthMode::None);
        assert_eq!(config.transport.http_port, 9191);
        assert_eq!(config.response.null_style, NullStyle::JsonNull);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(
            Path::new("/nonexistent/path/config.toml"),
            ConfigBuilder::new(),
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");

        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_file_invalid_endpoint() {
        let temp_file = create_temp_config("[engine]\nendpoint = \"not a valid url\"\n");

        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Invalid engine endpoint"));
    }

    #[test]
    fn test_load_token_from_file() {
        let temp_file = create_temp_config("[engine]\naccess_token = \"ya29.file\"\n");

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.engine.auth, AuthMode::Token);
        assert_eq!(config.engine.access_token.as_deref(), Some("ya29.file"));
    }

    #[test]
    fn test_load_invalid_http_host_ignored() {
        let temp_file = create_temp_config("[transport]\nhttp_host = \"not_an_ip\"\n");

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            config.transport.http_host,
            "0.0.0.0".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_load_invalid_null_style() {
        let temp_file = create_temp_config("[response]\nnull_style = \"blank\"\n");

        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_load_observability_config() {
        let toml_content = r#"
[observability]
otlp_endpoint = "http://jaeger:4317"
service_name = "my-service"
log_level = "trace"
json_logs = true
"#;
        let temp_file = create_temp_config(toml_content);

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            config.telemetry.otlp_endpoint,
            Some("http://jaeger:4317".to_string())
        );
        assert_eq!(config.telemetry.service_name, "my-service");
        assert_eq!(config.telemetry.log_level, "trace");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_empty_config_file() {
        let temp_file = create_temp_config("");

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert!(config.project_id().is_none());
    }

    #[test]
    fn test_find_config_file_not_found() {
        let result = find_config_file();
        assert!(result.is_none() || result.unwrap().exists());
    }
}
