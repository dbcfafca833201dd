/// Shared error type used across every mesh crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream degraded: {0}")]
    UpstreamDegraded(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Carries whatever content was accumulated before the fault that cut
    /// the operation short (e.g. a cancelled stream). Callers may choose
    /// to accept the partial content rather than treat this as a hard failure.
    #[error("partial completion ({message}): {} chars recovered", content.len())]
    PartialCompletion { content: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transient-remote errors are eligible for local recovery (retry,
    /// fallback, cache fallback); everything else is not.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Http(_) | Error::RateLimited(_) => true,
            Error::Provider { message, .. } => {
                message.contains("HTTP 500")
                    || message.contains("HTTP 502")
                    || message.contains("HTTP 503")
                    || message.contains("HTTP 504")
                    || message.contains("HTTP 529")
            }
            _ => false,
        }
    }
}
