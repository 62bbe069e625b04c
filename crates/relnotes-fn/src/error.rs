use relnotes_bigquery::BigQueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[source] BigQueryError),

    #[error("Query submission failed: {0}")]
    Submission(#[source] BigQueryError),

    #[error("Query job failed ({reason}): {message}")]
    Execution { reason: String, message: String },

    #[error("Result read failed: {0}")]
    Read(#[source] BigQueryError),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Response encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Request deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Wrap an engine error, folding caller cancellation into [`Error::Cancelled`].
    pub(crate) fn from_engine(err: BigQueryError, wrap: fn(BigQueryError) -> Self) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            wrap(err)
        }
    }

    /// Cursor failures: malformed rows are decode errors, the rest read errors.
    pub(crate) fn from_read(err: BigQueryError) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::from_engine(err, Self::Read)
        }
    }

    /// Job wait failures carry whatever status the engine reported.
    pub(crate) fn from_wait(err: BigQueryError) -> Self {
        if err.is_cancelled() {
            return Self::Cancelled;
        }
        Self::Execution {
            reason: err.reason().unwrap_or("jobStatusUnavailable").to_string(),
            message: err.to_string(),
        }
    }

    /// Short label used for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::Submission(_) => "submission",
            Self::Execution { .. } => "execution",
            Self::Read(_) => "read",
            Self::Decode(_) => "decode",
            Self::Encoding(_) => "encoding",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded(_) => "deadline",
            Self::Transport(_) => "transport",
        }
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    #[must_use]
    pub const fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read(_))
    }

    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
