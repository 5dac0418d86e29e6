use crate::transport::TransportError;
use std::sync::Arc;
use thiserror::Error;

/// Structured error context for configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "HTTPBULK_CONCURRENCY_LIMIT")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "executor_options", "http_sender")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type.
///
/// Errors are `Clone` so a cached failure (e.g. a body read error held by a
/// [`BulkFuture`](crate::BulkFuture)) can be handed out any number of times.
/// Sources that are not `Clone` themselves are kept behind an `Arc`, which
/// also lets callers check that two replays are the very same error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request hook failed: {0}")]
    Hook(Arc<dyn std::error::Error + Send + Sync>),

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded while waiting for result")]
    DeadlineExceeded,

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("failed to decode {format} body: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("response body already consumed")]
    BodyConsumed,

    #[error("executor is closed")]
    ExecutorClosed,

    #[error("request task for {url:?} ended without publishing a result")]
    TaskAborted { url: String },

    #[error("http request failed for {url}: HTTP {status}")]
    RequestFailed { url: String, status: u16 },

    #[error("failed to get last-modified date for {url}: {message}")]
    LastModified { url: String, message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Wrap an arbitrary failure raised by a request hook.
    pub fn hook<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Hook(Arc::from(err.into()))
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True for both submission-side and consumer-side cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode {
            format: "json",
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Decode {
            format: "yaml",
            message: err.to_string(),
        }
    }
}
