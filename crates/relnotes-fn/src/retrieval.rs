//! Release notes retrieval
//!
//! One lookup runs strictly in sequence: open a client, submit the query,
//! wait for the job, drain the cursor, decode each row. The client lives
//! for the duration of the call and is dropped on every exit path.

#[cfg(feature = "metrics")]
use std::time::Instant;

use relnotes_bigquery::{Client, ClientOptions};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::decode::decode_row;
use crate::query::build_query;
use crate::types::{ReleaseNote, ReleaseNoteQuery};
use crate::{Error, Result};

/// Where and as whom lookups run: billing project plus engine options.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    project_id: String,
    options: ClientOptions,
}

impl ProjectContext {
    #[must_use]
    pub fn new(project_id: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            project_id: project_id.into(),
            options,
        }
    }

    /// Context for the configured project, `None` when no project is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(project_id) = config.project_id() else {
            return Ok(None);
        };
        let options = config.engine.client_options()?;
        Ok(Some(Self::new(project_id, options)))
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }
}

/// Fetch the latest notes for `product` and `release_note_type`.
pub async fn fetch(
    ctx: &CancellationToken,
    project: &ProjectContext,
    product: &str,
    release_note_type: &str,
) -> Result<Vec<ReleaseNote>> {
    fetch_query(ctx, project, &ReleaseNoteQuery::new(product, release_note_type)).await
}

/// Run one lookup; rows come back in engine order (newest first).
///
/// No step is retried. A failure anywhere discards everything read so far.
#[tracing::instrument(
    name = "fetch_release_notes",
    skip_all,
    fields(
        project_id = %project.project_id(),
        product = %query.product,
        release_note_type = %query.release_note_type,
    )
)]
pub async fn fetch_query(
    ctx: &CancellationToken,
    project: &ProjectContext,
    query: &ReleaseNoteQuery,
) -> Result<Vec<ReleaseNote>> {
    #[cfg(feature = "metrics")]
    let start = Instant::now();

    let result = run_lookup(ctx, project, query).await;

    #[cfg(feature = "metrics")]
    {
        match &result {
            Ok(notes) => crate::observability::record_fetch(start.elapsed(), notes.len() as u64),
            Err(e) => crate::observability::record_fetch_error(e.kind()),
        }
    }

    if let Err(e) = &result {
        tracing::debug!(error = %e, kind = e.kind(), "Lookup failed");
    }

    result
}

async fn run_lookup(
    ctx: &CancellationToken,
    project: &ProjectContext,
    query: &ReleaseNoteQuery,
) -> Result<Vec<ReleaseNote>> {
    let client = Client::connect(project.project_id(), project.options(), ctx)
        .await
        .map_err(|e| Error::from_engine(e, Error::Connection))?;

    let mut job = build_query(query)
        .run(&client, ctx)
        .await
        .map_err(|e| Error::from_engine(e, Error::Submission))?;

    let status = job.wait(&client, ctx).await.map_err(Error::from_wait)?;
    if let Some(failure) = status.error() {
        return Err(Error::Execution {
            reason: failure.reason.clone(),
            message: failure.message.clone(),
        });
    }

    let mut rows = job.read(&client);
    let mut notes = Vec::new();
    while let Some(row) = rows.next(ctx).await.map_err(Error::from_read)? {
        notes.push(decode_row(&row)?);
    }

    tracing::info!(
        count = notes.len(),
        job_id = job.id(),
        "Found {} entries for: {}",
        notes.len(),
        query.product
    );

    Ok(notes)
}
