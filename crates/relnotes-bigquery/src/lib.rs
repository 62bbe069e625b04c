//! Minimal BigQuery REST v2 client.
//!
//! Covers exactly what a read-only analytical lookup needs: submit a
//! parameterized standard-SQL query job, wait for it, and walk its result
//! rows with a forward-only cursor.
//!
//! # Features
//!
//! - Named bind parameters, never interpolated into the SQL text
//! - Credentials from the instance metadata server, a static token, or none
//!   (emulators)
//! - Every network call races a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - Typed cell values driven by the result schema
//! - `test-utils` feature: in-process [`testing::MockBigQuery`] server
//!
//! # Example
//!
//! ```rust,ignore
//! use relnotes_bigquery::{Client, ClientOptions, Query};
//! use tokio_util::sync::CancellationToken;
//!
//! let ctx = CancellationToken::new();
//! let client = Client::connect("my-project", &ClientOptions::default(), &ctx).await?;
//!
//! let mut job = Query::new("SELECT @greeting AS greeting")
//!     .with_parameter("greeting", "hello")
//!     .with_location("US")
//!     .run(&client, &ctx)
//!     .await?;
//! job.wait(&client, &ctx).await?;
//!
//! let mut rows = job.read(&client);
//! while let Some(row) = rows.next(&ctx).await? {
//!     println!("{}", row.get(0).map(ToString::to_string).unwrap_or_default());
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod job;
pub mod query;
pub mod rows;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod value;

mod wire;

pub use auth::{Anonymous, Credentials, MetadataServer, StaticToken, TokenProvider};
pub use client::{Client, ClientOptions, DEFAULT_ENDPOINT, default_endpoint};
pub use error::{BigQueryError, Result};
pub use job::{Job, JobError, JobState, JobStatus};
pub use query::{ParameterValue, Query, QueryParameter};
pub use rows::{Row, RowIterator};
pub use schema::{Field, FieldType, Schema};
pub use value::Value;
