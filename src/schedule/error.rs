//! Errors raised by scheduler backends and by the job lifecycle.
use thiserror::Error;

use super::permission::Permission;

/// Errors returned by [`Handler`](super::Handler) implementations.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// No scheduler entry exists for the job being removed.
    ///
    /// Lifecycle code treats this as "already absent" rather than a failure.
    #[error("scheduled job not found")]
    NotFound,

    /// A recurrence expression is not understood by the backend.
    #[error("invalid schedule '{expression}': {reason}")]
    InvalidSchedule {
        /// Expression as configured.
        expression: String,
        /// Why the backend rejected it.
        reason: String,
    },

    /// A tool or service the backend relies on cannot be reached.
    #[error("{tool} is not available: {reason}")]
    Unavailable {
        /// Tool or service name (e.g. `"systemctl"`).
        tool: String,
        /// Human-readable detail.
        reason: String,
    },

    /// The backend cannot express the resolved permission.
    #[error("permission '{permission}' is not supported by the {scheduler} scheduler")]
    UnsupportedPermission {
        /// Permission that was requested.
        permission: Permission,
        /// Backend name.
        scheduler: &'static str,
    },

    /// A native scheduler command exited with a non-zero status.
    #[error("command '{program}' failed (exit {exit_code}): {stderr}")]
    ExecutionFailed {
        /// Program that was invoked.
        program: String,
        /// Exit code, `-1` when terminated by a signal.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// Reading or writing a scheduler artifact failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Artifact path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Any other backend failure (typically from process invocation).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// `true` for the [`HandlerError::NotFound`] sentinel.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Wrap an I/O error with the artifact path it concerns.
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Shorthand for backend results.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Errors returned by the lifecycle operations
/// ([`schedule_jobs`](super::schedule_jobs), [`remove_jobs`](super::remove_jobs),
/// [`status_jobs`](super::status_jobs)).
#[derive(Error, Debug)]
pub enum JobError {
    /// The backend could not acquire its resources; no job was touched.
    #[error("cannot initialise the scheduler: {0}")]
    Init(#[source] HandlerError),

    /// The current process may not manage the job with the resolved permission.
    #[error(
        "user is not allowed to {action} job {job} with permission '{permission}', please retry with elevated privileges"
    )]
    PermissionDenied {
        /// Job name (`command@profile`).
        job: String,
        /// `"create"` or `"remove"`.
        action: &'static str,
        /// Resolved permission.
        permission: Permission,
    },

    /// The backend could not determine whether the job is feasible.
    #[error("cannot verify permission for job {job}: {source}")]
    PermissionCheck {
        /// Job name.
        job: String,
        /// Backend error.
        source: HandlerError,
    },

    /// A recurrence expression of the job is malformed.
    #[error("invalid schedule for job {job}: {source}")]
    Parse {
        /// Job name.
        job: String,
        /// Backend error.
        source: HandlerError,
    },

    /// Presenting the job's schedules failed.
    #[error("cannot display schedules for job {job}: {source}")]
    Display {
        /// Job name.
        job: String,
        /// Backend error.
        source: HandlerError,
    },

    /// Installing the job failed.
    #[error("error creating job {job}: {source}")]
    Create {
        /// Job name.
        job: String,
        /// Backend error.
        source: HandlerError,
    },

    /// Removing the job failed for a reason other than it being absent.
    #[error("error removing job {job}: {source}")]
    Remove {
        /// Job name.
        job: String,
        /// Backend error.
        source: HandlerError,
    },

    /// Status was requested for a removal-only job.
    #[error("job {job} has no schedule and can only be removed")]
    RemoveOnly {
        /// Job name.
        job: String,
    },

    /// Presenting a job's or the profile's status failed.
    #[error("cannot display status: {0}")]
    Status(#[source] HandlerError),
}

impl JobError {
    /// Name of the job the error concerns, when it concerns a single job.
    #[must_use]
    pub fn job(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { job, .. }
            | Self::PermissionCheck { job, .. }
            | Self::Parse { job, .. }
            | Self::Display { job, .. }
            | Self::Create { job, .. }
            | Self::Remove { job, .. }
            | Self::RemoveOnly { job } => Some(job.as_str()),
            Self::Init(_) | Self::Status(_) => None,
        }
    }
}
