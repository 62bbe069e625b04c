//! Credential sources for BigQuery requests

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{BigQueryError, Result};
use crate::wire::AccessTokenResponse;

/// Default GCE/Cloud Run metadata server host
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";

/// Async access-token source
///
/// Returns `None` when requests should go out unauthenticated (emulators).
#[async_trait]
pub trait TokenProvider: Send + Sync + fmt::Debug {
    async fn token(&self) -> Result<Option<String>>;
}

/// Credential selection, convertible into a [`TokenProvider`].
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Ambient service account from the instance metadata server
    MetadataServer { host: String },
    /// Pre-minted OAuth2 access token
    Token(String),
    /// No `Authorization` header
    Anonymous,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::MetadataServer {
            host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataServer { host } => f
                .debug_struct("MetadataServer")
                .field("host", host)
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Credentials {
    /// Build the provider for this credential source.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn TokenProvider> {
        match self {
            Self::MetadataServer { host } => Arc::new(MetadataServer::new(host)),
            Self::Token(token) => Arc::new(StaticToken::new(token.clone())),
            Self::Anonymous => Arc::new(Anonymous),
        }
    }
}

/// Fixed access token
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self { token }
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>> {
        if self.token.is_empty() {
            return Err(BigQueryError::auth("access token is empty"));
        }
        Ok(Some(self.token.clone()))
    }
}

/// Unauthenticated access
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl TokenProvider for Anonymous {
    async fn token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Token from the instance metadata server
#[derive(Debug, Clone)]
pub struct MetadataServer {
    host: String,
}

impl MetadataServer {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn token_url(&self) -> Result<Url> {
        Url::parse(&format!("http://{}{METADATA_TOKEN_PATH}", self.host))
            .map_err(|e| BigQueryError::auth(format!("invalid metadata host '{}': {e}", self.host)))
    }
}

#[async_trait]
impl TokenProvider for MetadataServer {
    async fn token(&self) -> Result<Option<String>> {
        let url = self.token_url()?;

        // The metadata server is link-local; never route it through a proxy
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| BigQueryError::auth(format!("failed to build HTTP client: {e}")))?;

        let response = http
            .get(url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .send()
            .await
            .map_err(|e| BigQueryError::auth(format!("metadata server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BigQueryError::auth(format!(
                "metadata server returned {status}"
            )));
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| BigQueryError::auth(format!("invalid metadata token response: {e}")))?;

        tracing::debug!(host = %self.host, "Access token obtained from metadata server");
        Ok(Some(body.access_token))
    }
}
