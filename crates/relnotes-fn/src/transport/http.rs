//! HTTP endpoint serving release notes

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{MatchedPath, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants::{ERROR_PREFIX, STATUS_OK};
use crate::retrieval::{ProjectContext, fetch_query};
use crate::types::{NullStyle, ReleaseNotesBody, RequestParams};
use crate::{Error, Result};

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Shared, read-only handler state
#[derive(Debug, Clone)]
pub struct AppState {
    project: Option<ProjectContext>,
    null_style: NullStyle,
    request_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub const fn new(project: Option<ProjectContext>, null_style: NullStyle) -> Self {
        Self {
            project,
            null_style,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ProjectContext::from_config(config)?,
            config.response.null_style,
        ))
    }
}

/// Build the router with every route registered explicitly.
///
/// `request_timeout` bounds each lookup; when it fires the lookup is
/// cancelled and the caller gets the usual failure response.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let state = AppState {
        request_timeout,
        ..state
    };

    #[allow(unused_mut)]
    let mut app = Router::new()
        .route("/", any(release_notes_handler))
        .route("/release-notes", any(release_notes_handler))
        .route("/tool", any(release_notes_handler))
        .route("/health", get(health_handler));

    #[cfg(feature = "metrics")]
    {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.with_state(state).layer(TraceLayer::new_for_http())
}

/// Bind `host:port` and serve `app` until `shutdown` resolves.
pub async fn run_http(
    app: Router,
    host: IpAddr,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::new(host, port);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("HTTP server listening on {addr}");
    serve(listener, app, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Transport(format!("HTTP server error: {e}")))?;

    tracing::info!("HTTP server shutdown complete");
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: STATUS_OK,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(feature = "metrics")]
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        crate::observability::render_metrics(),
    )
}

/// Any method. Parameters come from a JSON body, then the query string,
/// then the defaults. A body that is not JSON is ignored.
async fn release_notes_handler(
    State(state): State<AppState>,
    path: MatchedPath,
    uri: Uri,
    body: Bytes,
) -> Response {
    #[cfg(feature = "metrics")]
    crate::observability::record_request(path.as_str());

    let from_body = RequestParams::from_json_body(&body).unwrap_or_else(|e| {
        tracing::warn!(route = path.as_str(), error = %e, "Ignoring request body that is not JSON");
        RequestParams::default()
    });
    let from_query = RequestParams::from_query_string(uri.query());
    let query = from_body.or(from_query).into_query();

    let Some(project) = state.project.as_ref() else {
        return error_response(&Error::Config(
            "PROJECT_ID is not set; no billing project for the query".to_string(),
        ));
    };

    // Dropping the handler future (client gone) cancels the lookup too
    let ctx = CancellationToken::new();
    let _cancel_on_drop = ctx.clone().drop_guard();

    let lookup = tokio::time::timeout(state.request_timeout, fetch_query(&ctx, project, &query));
    let encoded = match lookup.await {
        Ok(result) => {
            result.and_then(|notes| ReleaseNotesBody::new(&notes, state.null_style).to_vec())
        }
        Err(_) => Err(Error::DeadlineExceeded(state.request_timeout)),
    };

    match encoded {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)],
            body,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &Error) -> Response {
    tracing::error!(error = %err, kind = err.kind(), "Release notes lookup failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)],
        format!("{ERROR_PREFIX}: {err}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn(state: AppState) -> (String, tokio::sync::oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let app = router(state, Duration::from_secs(5));
        tokio::spawn(serve(listener, app, async {
            let _ = rx.await;
        }));
        (base, tx)
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _stop) = spawn(AppState::new(None, NullStyle::Sentinel)).await;

        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_missing_project_is_config_error() {
        let (base, _stop) = spawn(AppState::new(None, NullStyle::Sentinel)).await;

        let response = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE.as_str()],
            CONTENT_TYPE_TEXT
        );

        let text = response.text().await.unwrap();
        assert!(text.starts_with("Error calling"));
        assert!(text.contains("Configuration error"));
    }

    #[tokio::test]
    async fn test_unparseable_input_still_reaches_lookup() {
        let (base, _stop) = spawn(AppState::new(None, NullStyle::Sentinel)).await;

        for body in ["{not json", "hello", "[]", r#"{"product": 5}"#, "product=GKE"] {
            let response = reqwest::Client::new()
                .post(format!("{base}/release-notes?type=FIX&release_note_type=FEATURE"))
                .body(body)
                .send()
                .await
                .unwrap();
            // No project configured, so getting this far means a config error
            assert_eq!(response.status(), 500, "body {body:?}");
            assert!(response.text().await.unwrap().contains("Configuration error"));
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (base, _stop) = spawn(AppState::new(None, NullStyle::Sentinel)).await;

        let response = reqwest::get(format!("{base}/nope")).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = router(AppState::new(None, NullStyle::Sentinel), Duration::from_secs(5));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, app, async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_transport_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let app = router(AppState::new(None, NullStyle::Sentinel), Duration::from_secs(5));

        let err = run_http(app, "127.0.0.1".parse().unwrap(), port, async {})
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Failed to bind"));
    }
}
