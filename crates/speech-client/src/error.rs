/// How far a recognition failure should propagate.
///
/// `Terminal` errors are caused by the request itself (credentials, quota,
/// malformed audio config) and will fail identically on every strategy, so
/// the chain aborts. `Transient` errors are worth retrying and worth handing
/// to the next strategy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("recognition request rejected: {0}")]
    InvalidRequest(String),
    #[error("transient recognition failure: {0}")]
    Transient(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
    #[error("operation still running after {attempts} polls")]
    PollTimeout { attempts: u32 },
    #[error("operation failed with code {code}: {message}")]
    OperationFailed { code: i32, message: String },
}

impl Error {
    /// True when no strategy in the chain can succeed and the caller should
    /// stop immediately instead of falling back.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::Permission(_) | Error::InvalidRequest(_)
        )
    }

    /// True when the same strategy is worth another attempt after a backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Auth(_) | Error::Permission(_) | Error::InvalidRequest(_) => false,
            Error::PollTimeout { .. } | Error::OperationFailed { .. } => false,
            Error::Transient(_)
            | Error::Http(_)
            | Error::Json(_)
            | Error::Url(_)
            | Error::UnexpectedResponse(_) => true,
        }
    }
}

/// Maps an HTTP status from the speech endpoint to the error taxonomy.
///
/// 401 and 403 are credential problems, 400 means the service rejected the
/// config or audio payload, everything else (408, 429, 5xx) is treated as
/// transient so the caller can retry or fall back.
pub(crate) fn classify_status(status: reqwest::StatusCode, detail: String) -> Error {
    match status.as_u16() {
        401 => Error::Auth(detail),
        403 => Error::Permission(detail),
        400 => Error::InvalidRequest(detail),
        code => Error::Transient(format!("http {code}: {detail}")),
    }
}

/// Pulls the human-readable message out of a provider error body.
///
/// Error responses look like `{"error": {"code": 403, "message": "...",
/// "status": "PERMISSION_DENIED"}}`. Falls back to the raw body (truncated)
/// when the shape is different.
pub(crate) fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }

    const MAX_DETAIL_LEN: usize = 200;
    match trimmed.char_indices().nth(MAX_DETAIL_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
