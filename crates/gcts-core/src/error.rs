//! Error taxonomy for gCTS pipeline steps.

/// Errors raised while talking to the ABAP system or a hosting provider.
#[derive(Debug, thiserror::Error)]
pub enum GctsError {
    /// No response was received (connection refused, DNS, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived with a status the caller cannot proceed with.
    #[error("request to {url} failed with HTTP status {status}")]
    Http { status: u16, url: String },

    #[error("cannot parse HTTP response as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot parse HTTP response as XML: {0}")]
    Xml(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no commit to rollback to identified")]
    NoRollbackCommit,

    #[error("no commit with a successful status found on {provider}")]
    NoSuccessfulCommit { provider: String },

    #[error("could not retrieve x-csrf-token from server")]
    MissingCsrfToken,

    #[error("unit tests failed in package {package}: {failed_methods} failing method(s)")]
    UnitTestsFailed {
        package: String,
        failed_methods: usize,
    },

    /// The deploy invocation ran but reported failure.
    #[error("deploy of the resolved commit failed: {0}")]
    DeployFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GctsError {
    fn from(err: reqwest::Error) -> Self {
        GctsError::Transport(err.to_string())
    }
}

impl From<quick_xml::DeError> for GctsError {
    fn from(err: quick_xml::DeError) -> Self {
        GctsError::Xml(err.to_string())
    }
}

impl GctsError {
    /// Whether this is a content-level verdict rather than a transport,
    /// decode or configuration failure.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            GctsError::NoRollbackCommit
                | GctsError::NoSuccessfulCommit { .. }
                | GctsError::UnitTestsFailed { .. }
        )
    }
}

/// Result type for gCTS operations.
pub type Result<T> = std::result::Result<T, GctsError>;
