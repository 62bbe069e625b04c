//! Parameterized query definitions and job submission.

use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::error::Result;
use crate::job::Job;
use crate::wire::{JobInsert, JobResource};

/// Value bound to a named query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    String(String),
    Int64(i64),
    Bool(bool),
}

impl ParameterValue {
    /// BigQuery standard SQL type name sent as `parameterType.type`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "STRING",
            Self::Int64(_) => "INT64",
            Self::Bool(_) => "BOOL",
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Named bind parameter (`@name` in the SQL text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    name: String,
    value: ParameterValue,
}

impl QueryParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> &ParameterValue {
        &self.value
    }
}

/// Standard SQL query with named parameters and an optional job location.
///
/// Values are always sent as bind parameters; the SQL text is forwarded
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    sql: String,
    parameters: Vec<QueryParameter>,
    location: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
            location: None,
        }
    }

    /// Bind a named parameter.
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.push(QueryParameter::new(name, value));
        self
    }

    /// Pin the job to a location (`US`, `EU`, `us-central1`, ...).
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Submit the query as an asynchronous job (`jobs.insert`).
    ///
    /// Returns as soon as BigQuery accepts the job; use [`Job::wait`] to block
    /// until it reaches a terminal state.
    pub async fn run(&self, client: &Client, ctx: &CancellationToken) -> Result<Job> {
        let url = client.project_url(&["jobs"])?;
        let body = JobInsert::new(client.project_id(), self);

        let resource: JobResource = client
            .execute(ctx, client.http().post(url).json(&body))
            .await?;

        tracing::debug!(
            job_id = %resource.job_reference.job_id,
            location = resource.job_reference.location.as_deref().unwrap_or_default(),
            "Query job inserted"
        );

        Ok(Job::from_resource(resource))
    }
}
