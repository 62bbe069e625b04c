//! HTTP function serving the latest Google Cloud release notes
//!
//! Each request runs one parameterized query against the public
//! `google_cloud_release_notes` dataset in BigQuery and answers with the ten
//! newest matching notes as a JSON array.
//!
//! # Example
//!
//! ```no_run
//! use relnotes_fn::{ConfigBuilder, ProjectContext, fetch};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> relnotes_fn::Result<()> {
//! let config = ConfigBuilder::new().project_id("my-project").build()?;
//! let project = ProjectContext::from_config(&config)?.expect("project configured");
//!
//! let notes = fetch(&CancellationToken::new(), &project, "Cloud Run", "FEATURE").await?;
//! for note in &notes {
//!     println!("{:?}: {:?}", note.published_at, note.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod decode;
mod error;
pub mod observability;
mod query;
mod retrieval;
pub mod transport;
pub mod types;

pub use config::{
    AuthMode, Config, ConfigBuilder, EngineConfig, ResponseConfig, TelemetryConfig,
    TransportConfig,
};
pub use decode::decode_row;
pub use error::{Error, Result};
pub use query::build_query;
pub use retrieval::{ProjectContext, fetch, fetch_query};
pub use types::{NullStyle, ReleaseNote, ReleaseNoteQuery, ReleaseNotesBody, RequestParams};
