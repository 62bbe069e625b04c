//! Query jobs: status polling and result access

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{Client, with_cancel};
use crate::error::Result;
use crate::rows::RowIterator;
use crate::wire::{ErrorProto, JobReferenceWire, JobResource, JobStatusWire};

/// First delay between `jobs.get` polls
const POLL_INITIAL: Duration = Duration::from_millis(100);
/// Upper bound for the poll delay
const POLL_MAX: Duration = Duration::from_secs(2);

/// Lifecycle state reported by BigQuery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    fn parse(state: &str) -> Self {
        match state {
            "DONE" => Self::Done,
            "RUNNING" => Self::Running,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
        })
    }
}

/// Failure recorded on a finished job (`status.errorResult`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    pub reason: String,
    pub message: String,
}

impl From<ErrorProto> for JobError {
    fn from(proto: ErrorProto) -> Self {
        Self {
            reason: proto.reason.unwrap_or_else(|| "unknown".to_string()),
            message: proto.message.unwrap_or_default(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

/// Snapshot of a job's status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    state: JobState,
    error: Option<JobError>,
}

impl JobStatus {
    fn from_wire(wire: Option<JobStatusWire>) -> Self {
        wire.map_or(
            Self {
                state: JobState::Pending,
                error: None,
            },
            |w| Self {
                state: JobState::parse(&w.state),
                error: w.error_result.map(JobError::from),
            },
        )
    }

    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, JobState::Done)
    }

    /// Terminal error, if the job failed or was cancelled remotely.
    #[must_use]
    pub const fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }
}

/// Handle to a submitted query job
#[derive(Debug, Clone)]
pub struct Job {
    reference: JobReferenceWire,
    last_status: JobStatus,
}

impl Job {
    pub(crate) fn from_resource(resource: JobResource) -> Self {
        Self {
            reference: resource.job_reference,
            last_status: JobStatus::from_wire(resource.status),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.reference.job_id
    }

    /// Project the job runs in, as echoed back by the server.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.reference.project_id
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.reference.location.as_deref()
    }

    /// Status as of the last response seen for this job.
    #[must_use]
    pub const fn last_status(&self) -> &JobStatus {
        &self.last_status
    }

    /// Fetch the current status (`jobs.get`).
    pub async fn status(&self, client: &Client, ctx: &CancellationToken) -> Result<JobStatus> {
        let url = self.located(client.project_url(&["jobs", self.reference.job_id.as_str()])?);
        let resource: JobResource = client.execute(ctx, client.http().get(url)).await?;
        Ok(JobStatus::from_wire(resource.status))
    }

    /// Block until the job reaches `DONE`.
    ///
    /// A failed job still returns `Ok`; inspect [`JobStatus::error`]. Polls
    /// with doubling backoff and no deadline of its own: only `ctx` stops it.
    pub async fn wait(&mut self, client: &Client, ctx: &CancellationToken) -> Result<JobStatus> {
        let mut delay = POLL_INITIAL;
        while !self.last_status.is_done() {
            with_cancel(ctx, async {
                tokio::time::sleep(delay).await;
                Ok(())
            })
            .await?;

            self.last_status = self.status(client, ctx).await?;
            tracing::trace!(
                project_id = self.project_id(),
                job_id = %self.reference.job_id,
                state = %self.last_status.state,
                "Polled job"
            );
            delay = (delay * 2).min(POLL_MAX);
        }
        Ok(self.last_status.clone())
    }

    /// Open a forward-only cursor over the job's results.
    ///
    /// No request is made until the first row is pulled.
    #[must_use]
    pub fn read<'c>(&self, client: &'c Client) -> RowIterator<'c> {
        RowIterator::new(client, self.reference.clone())
    }

    fn located(&self, mut url: Url) -> Url {
        if let Some(location) = &self.reference.location {
            url.query_pairs_mut().append_pair("location", location);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(state: &str, error: Option<(&str, &str)>) -> JobResource {
        let mut json = serde_json::json!({
            "jobReference": {"projectId": "p", "jobId": "job_1", "location": "US"},
            "status": {"state": state}
        });
        if let Some((reason, message)) = error {
            json["status"]["errorResult"] = serde_json::json!({"reason": reason, "message": message});
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_job_from_running_resource() {
        let job = Job::from_resource(resource("RUNNING", None));
        assert_eq!(job.id(), "job_1");
        assert_eq!(job.project_id(), "p");
        assert_eq!(job.location(), Some("US"));
        assert_eq!(job.last_status().state(), JobState::Running);
        assert!(!job.last_status().is_done());
    }

    #[test]
    fn test_job_failed_status() {
        let job = Job::from_resource(resource("DONE", Some(("stopped", "Job cancelled"))));
        let status = job.last_status();
        assert!(status.is_done());
        let err = status.error().unwrap();
        assert_eq!(err.reason, "stopped");
        assert_eq!(err.to_string(), "stopped: Job cancelled");
    }

    #[test]
    fn test_missing_status_is_pending() {
        let status = JobStatus::from_wire(None);
        assert_eq!(status.state(), JobState::Pending);
        assert!(status.error().is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(JobState::parse("DONE").to_string(), "DONE");
        assert_eq!(JobState::parse("RUNNING").to_string(), "RUNNING");
        assert_eq!(JobState::parse("weird").to_string(), "PENDING");
    }

    mod against_mock {
        use super::*;
        use crate::client::ClientOptions;
        use crate::query::Query;
        use crate::testing::MockBigQuery;
        use crate::auth::Credentials;

        async fn connect(mock: &MockBigQuery) -> Client {
            let options = ClientOptions::new(mock.endpoint(), &Credentials::Anonymous);
            Client::connect(mock.project_id(), &options, &CancellationToken::new())
                .await
                .unwrap()
        }

        #[tokio::test]
        async fn test_wait_polls_until_done() {
            let mock = MockBigQuery::builder().pending_polls(2).start().await.unwrap();
            let client = connect(&mock).await;
            let ctx = CancellationToken::new();

            let mut job = Query::new("SELECT 1").run(&client, &ctx).await.unwrap();
            assert_eq!(job.last_status().state(), JobState::Running);

            let status = job.wait(&client, &ctx).await.unwrap();
            assert!(status.is_done());
            assert!(status.error().is_none());
            assert_eq!(mock.status_polls(), 2);
        }

        #[tokio::test]
        async fn test_wait_reports_remote_failure() {
            let mock = MockBigQuery::builder()
                .pending_polls(1)
                .job_failure("invalidQuery", "Unrecognized name: nope")
                .start()
                .await
                .unwrap();
            let client = connect(&mock).await;
            let ctx = CancellationToken::new();

            let mut job = Query::new("SELECT nope").run(&client, &ctx).await.unwrap();
            let status = job.wait(&client, &ctx).await.unwrap();
            let err = status.error().unwrap();
            assert_eq!(err.reason, "invalidQuery");
            assert_eq!(err.message, "Unrecognized name: nope");
        }

        #[tokio::test]
        async fn test_wait_stops_on_cancel() {
            let mock = MockBigQuery::builder().never_finish().start().await.unwrap();
            let client = connect(&mock).await;
            let ctx = CancellationToken::new();

            let mut job = Query::new("SELECT 1").run(&client, &ctx).await.unwrap();
            let canceller = ctx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                canceller.cancel();
            });

            let err = tokio::time::timeout(Duration::from_secs(5), job.wait(&client, &ctx))
                .await
                .expect("wait must return promptly after cancellation")
                .unwrap_err();
            assert!(err.is_cancelled());
        }

        #[tokio::test]
        async fn test_insert_rejected() {
            let mock = MockBigQuery::builder()
                .reject_insert(400, "invalidQuery", "Syntax error")
                .start()
                .await
                .unwrap();
            let client = connect(&mock).await;

            let err = Query::new("SELEC 1")
                .run(&client, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(400));
            assert_eq!(err.reason(), Some("invalidQuery"));
        }

        #[tokio::test]
        async fn test_insert_carries_parameters_and_location() {
            let mock = MockBigQuery::builder().start().await.unwrap();
            let client = connect(&mock).await;

            let job = Query::new("SELECT @p")
                .with_parameter("p", "v")
                .with_location("US")
                .run(&client, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(job.location(), Some("US"));
            assert_eq!(job.project_id(), mock.project_id());

            let inserted = mock.inserted_jobs();
            assert_eq!(inserted.len(), 1);
            assert_eq!(inserted[0]["configuration"]["query"]["query"], "SELECT @p");
            assert_eq!(
                inserted[0]["configuration"]["query"]["queryParameters"][0]["parameterValue"]["value"],
                "v"
            );
        }
    }

    #[test]
    fn test_job_error_defaults() {
        let err = JobError::from(ErrorProto {
            reason: None,
            message: None,
        });
        assert_eq!(err.reason, "unknown");
        assert!(err.message.is_empty());
    }
}
