use thiserror::Error;

/// Failures surfaced by the coordinator. None of them is fatal: each one leaves the
/// session usable with the affected feature unavailable.
///
/// A missing device fix is not an error; it is an absent coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location permission request failed: {0}")]
    PermissionRequestFailed(String),
    #[error("report submission failed: {0}")]
    SubmissionFailed(String),
    #[error("report fetch failed: {0}")]
    FetchFailed(String),
    #[error("{0} is required")]
    MissingField(&'static str),
}
