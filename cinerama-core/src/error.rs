use thiserror::Error;

/// Failures surfaced by the backend seam. Transient transport problems and
/// hold races are distinct variants because the checkout flow reacts to
/// them differently: network errors abandon the operation for a manual
/// retry, conflicts are never retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Backend(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// True when the hold race was lost to another session
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}
