//! In-process BigQuery REST double.
//!
//! Serves `jobs.insert`, `jobs.get` and `jobs.getQueryResults` on a loopback
//! port so clients can be exercised end to end without network access.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value as JsonValue, json};
use tokio::task::JoinHandle;
use url::Url;

/// Cells of one mocked row; `None` is sent as a JSON `null`
pub type MockRow = Vec<Option<String>>;

#[derive(Debug, Clone)]
struct Behaviour {
    project_id: String,
    schema: Vec<(String, String)>,
    rows: Vec<MockRow>,
    rows_when: Vec<(Vec<(String, String)>, Vec<MockRow>)>,
    page_size: Option<usize>,
    pending_polls: u32,
    results_not_ready: u32,
    never_finish: bool,
    job_failure: Option<(String, String)>,
    reject_insert: Option<(u16, String, String)>,
    expected_token: Option<String>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            schema: Vec::new(),
            rows: Vec::new(),
            rows_when: Vec::new(),
            page_size: None,
            pending_polls: 0,
            results_not_ready: 0,
            never_finish: false,
            job_failure: None,
            reject_insert: None,
            expected_token: None,
        }
    }
}

#[derive(Debug)]
struct MockJob {
    location: Option<String>,
    rows: Vec<MockRow>,
    polls_left: u32,
    not_ready_left: u32,
}

#[derive(Debug, Default)]
struct Recorded {
    inserts: Vec<JsonValue>,
    status_polls: usize,
    result_fetches: usize,
    jobs: HashMap<String, MockJob>,
}

#[derive(Debug)]
struct Shared {
    behaviour: Behaviour,
    recorded: Mutex<Recorded>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fluent configuration for [`MockBigQuery`]
#[derive(Debug, Default)]
pub struct MockBigQueryBuilder {
    behaviour: Behaviour,
}

impl MockBigQueryBuilder {
    /// Only this project exists; others answer `404 notFound`.
    #[must_use]
    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.behaviour.project_id = project_id.into();
        self
    }

    /// Result columns as `(name, type)` pairs.
    #[must_use]
    pub fn schema(mut self, fields: &[(&str, &str)]) -> Self {
        self.behaviour.schema = fields
            .iter()
            .map(|(n, t)| ((*n).to_string(), (*t).to_string()))
            .collect();
        self
    }

    /// Rows returned when no [`rows_when`](Self::rows_when) entry matches.
    #[must_use]
    pub fn rows(mut self, rows: Vec<MockRow>) -> Self {
        self.behaviour.rows = rows;
        self
    }

    /// Rows returned when every listed named parameter has the given value.
    #[must_use]
    pub fn rows_when(mut self, parameters: &[(&str, &str)], rows: Vec<MockRow>) -> Self {
        let parameters = parameters
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect();
        self.behaviour.rows_when.push((parameters, rows));
        self
    }

    /// Rows per result page when the client sends no `maxResults`.
    #[must_use]
    pub const fn page_size(mut self, rows: usize) -> Self {
        self.behaviour.page_size = Some(rows);
        self
    }

    /// Number of `jobs.get` polls answered with `RUNNING` before `DONE`.
    #[must_use]
    pub const fn pending_polls(mut self, polls: u32) -> Self {
        self.behaviour.pending_polls = polls;
        self
    }

    /// Number of result fetches answered with `jobComplete: false`.
    #[must_use]
    pub const fn results_not_ready(mut self, fetches: u32) -> Self {
        self.behaviour.results_not_ready = fetches;
        self
    }

    /// Jobs stay `RUNNING` forever.
    #[must_use]
    pub const fn never_finish(mut self) -> Self {
        self.behaviour.never_finish = true;
        self
    }

    /// Jobs finish `DONE` with this `errorResult`.
    #[must_use]
    pub fn job_failure(mut self, reason: impl Into<String>, message: impl Into<String>) -> Self {
        self.behaviour.job_failure = Some((reason.into(), message.into()));
        self
    }

    /// `jobs.insert` answers with this API error.
    #[must_use]
    pub fn reject_insert(
        mut self,
        status: u16,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.behaviour.reject_insert = Some((status, reason.into(), message.into()));
        self
    }

    /// Require `Authorization: Bearer <token>`; anything else gets `401`.
    #[must_use]
    pub fn expect_token(mut self, token: impl Into<String>) -> Self {
        self.behaviour.expected_token = Some(token.into());
        self
    }

    /// Bind a loopback port and start serving.
    pub async fn start(self) -> io::Result<MockBigQuery> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let endpoint = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let shared = Arc::new(Shared {
            behaviour: self.behaviour,
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/bigquery/v2/projects/{project}/jobs", post(insert_job))
            .route("/bigquery/v2/projects/{project}/jobs/{job_id}", get(get_job))
            .route(
                "/bigquery/v2/projects/{project}/queries/{job_id}",
                get(get_query_results),
            )
            .with_state(Arc::clone(&shared));

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "Mock BigQuery server stopped");
            }
        });

        Ok(MockBigQuery {
            endpoint,
            shared,
            handle,
        })
    }
}

/// Running mock server; shuts down when dropped.
#[derive(Debug)]
pub struct MockBigQuery {
    endpoint: Url,
    shared: Arc<Shared>,
    handle: JoinHandle<()>,
}

impl MockBigQuery {
    #[must_use]
    pub fn builder() -> MockBigQueryBuilder {
        MockBigQueryBuilder::default()
    }

    /// Base URL to use as the client endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Url {
        self.endpoint.clone()
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.shared.behaviour.project_id
    }

    /// Bodies of every accepted or rejected `jobs.insert`, in arrival order.
    #[must_use]
    pub fn inserted_jobs(&self) -> Vec<JsonValue> {
        self.shared.lock().inserts.clone()
    }

    #[must_use]
    pub fn status_polls(&self) -> usize {
        self.shared.lock().status_polls
    }

    #[must_use]
    pub fn result_fetches(&self) -> usize {
        self.shared.lock().result_fetches
    }
}

impl Drop for MockBigQuery {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════════════════════

type MockState = State<Arc<Shared>>;

fn api_error(status: StatusCode, reason: &str, message: &str) -> Response {
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": message,
            "errors": [{"reason": reason, "message": message}]
        }
    });
    (status, Json(body)).into_response()
}

fn check_request(shared: &Shared, headers: &HeaderMap, project: &str) -> Option<Response> {
    if let Some(expected) = &shared.behaviour.expected_token {
        let sent = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if sent != Some(expected.as_str()) {
            return Some(api_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Request is missing required authentication credential",
            ));
        }
    }
    if project != shared.behaviour.project_id {
        return Some(api_error(
            StatusCode::NOT_FOUND,
            "notFound",
            &format!("Not found: Project {project}"),
        ));
    }
    None
}

fn status_json(shared: &Shared, running: bool) -> JsonValue {
    if running {
        return json!({"state": "RUNNING"});
    }
    match &shared.behaviour.job_failure {
        Some((reason, message)) => json!({
            "state": "DONE",
            "errorResult": {"reason": reason, "message": message}
        }),
        None => json!({"state": "DONE"}),
    }
}

fn job_json(shared: &Shared, project: &str, job_id: &str, job: &MockJob) -> JsonValue {
    let running = shared.behaviour.never_finish || job.polls_left > 0;
    json!({
        "jobReference": {"projectId": project, "jobId": job_id, "location": job.location},
        "status": status_json(shared, running)
    })
}

fn bound_parameters(body: &JsonValue) -> HashMap<String, String> {
    body["configuration"]["query"]["queryParameters"]
        .as_array()
        .map(|params| {
            params
                .iter()
                .filter_map(|p| {
                    Some((
                        p["name"].as_str()?.to_string(),
                        p["parameterValue"]["value"].as_str()?.to_string(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn insert_job(
    State(shared): MockState,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Some(rejection) = check_request(&shared, &headers, &project) {
        return rejection;
    }

    let mut recorded = shared.lock();
    recorded.inserts.push(body.clone());

    if let Some((status, reason, message)) = &shared.behaviour.reject_insert {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST);
        return api_error(status, reason, message);
    }

    let params = bound_parameters(&body);
    let rows = shared
        .behaviour
        .rows_when
        .iter()
        .find(|(wanted, _)| wanted.iter().all(|(n, v)| params.get(n) == Some(v)))
        .map_or_else(|| shared.behaviour.rows.clone(), |(_, rows)| rows.clone());

    let job_id = format!("job_{}", recorded.jobs.len() + 1);
    let job = MockJob {
        location: body["jobReference"]["location"].as_str().map(str::to_string),
        rows,
        polls_left: shared.behaviour.pending_polls,
        not_ready_left: shared.behaviour.results_not_ready,
    };
    let response = job_json(&shared, &project, &job_id, &job);
    recorded.jobs.insert(job_id, job);
    drop(recorded);

    Json(response).into_response()
}

async fn get_job(
    State(shared): MockState,
    Path((project, job_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_request(&shared, &headers, &project) {
        return rejection;
    }

    let mut recorded = shared.lock();
    recorded.status_polls += 1;
    let Some(job) = recorded.jobs.get_mut(&job_id) else {
        return api_error(
            StatusCode::NOT_FOUND,
            "notFound",
            &format!("Not found: Job {project}:{job_id}"),
        );
    };
    job.polls_left = job.polls_left.saturating_sub(1);
    let response = job_json(&shared, &project, &job_id, job);
    drop(recorded);

    Json(response).into_response()
}

async fn get_query_results(
    State(shared): MockState,
    Path((project, job_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_request(&shared, &headers, &project) {
        return rejection;
    }

    let mut recorded = shared.lock();
    recorded.result_fetches += 1;
    let Some(job) = recorded.jobs.get_mut(&job_id) else {
        return api_error(
            StatusCode::NOT_FOUND,
            "notFound",
            &format!("Not found: Job {project}:{job_id}"),
        );
    };

    if let Some((reason, message)) = &shared.behaviour.job_failure {
        return api_error(StatusCode::BAD_REQUEST, reason, message);
    }
    if shared.behaviour.never_finish || job.not_ready_left > 0 {
        job.not_ready_left = job.not_ready_left.saturating_sub(1);
        return Json(json!({"jobComplete": false})).into_response();
    }

    let total = job.rows.len();
    let start = params
        .get("pageToken")
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(0)
        .min(total);
    let size = params
        .get("maxResults")
        .and_then(|n| n.parse::<usize>().ok())
        .or(shared.behaviour.page_size)
        .unwrap_or(total)
        .max(1);
    let end = start.saturating_add(size).min(total);

    let rows: Vec<JsonValue> = job.rows[start..end]
        .iter()
        .map(|row| json!({"f": row.iter().map(|cell| json!({"v": cell})).collect::<Vec<_>>()}))
        .collect();
    let fields: Vec<JsonValue> = shared
        .behaviour
        .schema
        .iter()
        .map(|(name, kind)| json!({"name": name, "type": kind, "mode": "NULLABLE"}))
        .collect();
    drop(recorded);

    let mut body = json!({
        "jobComplete": true,
        "jobReference": {"projectId": project, "jobId": job_id},
        "schema": {"fields": fields},
        "totalRows": total.to_string(),
        "rows": rows
    });
    if end < total {
        body["pageToken"] = json!(end.to_string());
    }
    Json(body).into_response()
}
