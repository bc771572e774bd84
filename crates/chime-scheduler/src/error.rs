use thiserror::Error;

/// Errors returned synchronously by scheduling calls.
///
/// Job-body failures and recovered panics are deliberately absent here:
/// they happen after the caller has already returned and are recorded on
/// the job itself (`Failed` status + last error) and forwarded to the
/// logging collaborator instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The schedule expression could not be parsed. The job is registered
    /// as Down and never scheduled.
    #[error("invalid schedule spec {spec:?}: {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// Empty spec or separator passed to a multi-spec registration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Scheduling call after the controller has been stopped.
    #[error("scheduler is not running")]
    NotRunning,

    /// The configured timezone name is not a known IANA zone.
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

impl SchedulerError {
    pub(crate) fn invalid_spec(spec: &str, reason: impl std::fmt::Display) -> Self {
        SchedulerError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
