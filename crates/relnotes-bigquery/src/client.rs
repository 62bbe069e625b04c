//! BigQuery client handle

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{Credentials, TokenProvider};
use crate::error::{BigQueryError, Result};

/// Public BigQuery REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com";

const API_ROOT: [&str; 2] = ["bigquery", "v2"];

/// Endpoint and credential source used to open a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    endpoint: Url,
    token_provider: Arc<dyn TokenProvider>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new(default_endpoint(), &Credentials::default())
    }
}

impl ClientOptions {
    #[must_use]
    pub fn new(endpoint: Url, credentials: &Credentials) -> Self {
        Self {
            endpoint,
            token_provider: credentials.provider(),
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Parsed [`DEFAULT_ENDPOINT`]
#[must_use]
pub fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL")
}

/// Connection handle bound to one project.
///
/// Owns its HTTP client and resolved access token. Nothing is shared between
/// handles; dropping the handle releases everything it holds.
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    project_id: String,
    token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("project_id", &self.project_id)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Open a client for `project_id`, resolving credentials up front.
    pub async fn connect(
        project_id: impl Into<String>,
        options: &ClientOptions,
        ctx: &CancellationToken,
    ) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(BigQueryError::invalid_config("project id is empty"));
        }
        if options.endpoint.cannot_be_a_base() {
            return Err(BigQueryError::invalid_config(format!(
                "endpoint '{}' cannot carry a path",
                options.endpoint
            )));
        }

        let token = with_cancel(ctx, options.token_provider.token()).await?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("relnotes-bigquery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(
            project_id = %project_id,
            endpoint = %options.endpoint,
            authenticated = token.is_some(),
            "BigQuery client opened"
        );

        Ok(Self {
            http,
            endpoint: options.endpoint.clone(),
            project_id,
            token,
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `{endpoint}/bigquery/v2/projects/{project}/{segments...}`, percent-encoded
    pub(crate) fn project_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| BigQueryError::invalid_config("endpoint cannot carry a path"))?
            .pop_if_empty()
            .extend(API_ROOT)
            .extend(["projects", self.project_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Send an authorized request and decode its JSON body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        request: RequestBuilder,
    ) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        with_cancel(ctx, async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BigQueryError::from_response(status.as_u16(), &body));
            }
            response
                .json::<T>()
                .await
                .map_err(|e| BigQueryError::decode(e.to_string()))
        })
        .await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        tracing::debug!(project_id = %self.project_id, "BigQuery client released");
    }
}

/// Race `fut` against the cancellation token.
pub(crate) async fn with_cancel<F, T>(ctx: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = ctx.cancelled() => Err(BigQueryError::cancelled()),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::Credentials;

    fn anonymous(endpoint: &str) -> ClientOptions {
        ClientOptions::new(Url::parse(endpoint).unwrap(), &Credentials::Anonymous)
    }

    #[tokio::test]
    async fn test_project_url_encodes_segments() {
        let ctx = CancellationToken::new();
        let client = Client::connect("example.com:proj", &anonymous("http://localhost:9050/"), &ctx)
            .await
            .unwrap();

        let url = client.project_url(&["queries", "job 1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9050/bigquery/v2/projects/example.com:proj/queries/job%201"
        );
    }

    #[tokio::test]
    async fn test_empty_project_rejected() {
        let ctx = CancellationToken::new();
        let err = Client::connect("  ", &anonymous("http://localhost:9050"), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[tokio::test]
    async fn test_non_base_endpoint_rejected() {
        let ctx = CancellationToken::new();
        let err = Client::connect("proj", &anonymous("mailto:someone@example.com"), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[tokio::test]
    async fn test_connect_fails_on_bad_credentials() {
        let ctx = CancellationToken::new();
        let options = ClientOptions::new(
            Url::parse("http://localhost:9050").unwrap(),
            &Credentials::Token(String::new()),
        );
        let err = Client::connect("proj", &options, &ctx).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_with_cancel_aborts_pending_future() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let result: Result<()> = with_cancel(&ctx, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_default_options_endpoint() {
        let options = ClientOptions::default();
        assert_eq!(options.endpoint().as_str(), "https://bigquery.googleapis.com/");
    }
}
