use reqwest::StatusCode;

/// All errors surfaced by the login flow and the league aggregation.
#[derive(Debug, thiserror::Error)]
pub enum FplError {
    /// Login could not be completed: missing CSRF token, unexpected login
    /// status, missing post-login cookies, or a failed redirect follow.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// The portal served a bot challenge that the single cookie retry did
    /// not clear.
    #[error("bot challenge not cleared (status {status})")]
    Challenge { status: StatusCode },

    /// A previously established session was rejected by a data endpoint.
    #[error("session no longer accepted upstream (status {status})")]
    SessionExpired { status: StatusCode },

    /// Upstream data was missing or malformed.
    #[error("league data error: {reason}")]
    Data { reason: String },

    /// HTTP transport failure (network, DNS, TLS, body read).
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },
}

impl FplError {
    pub fn auth(reason: impl Into<String>) -> Self {
        FplError::Auth {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        FplError::Data {
            reason: reason.into(),
        }
    }

    /// Short label used as the `error` field of the endpoint's failure body.
    pub fn category(&self) -> &'static str {
        match self {
            FplError::Auth { .. } => "authentication failed",
            FplError::Challenge { .. } => "bot challenge detected",
            FplError::SessionExpired { .. } => "session expired",
            FplError::Data { .. } => "league data unavailable",
            FplError::Http { .. } => "upstream request failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, FplError>;
