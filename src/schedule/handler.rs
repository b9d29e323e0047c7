//! The contract every scheduler backend implements, and backend selection.
use std::fmt;
use std::sync::Arc;

use super::crontab::CrontabHandler;
use super::error::HandlerResult;
use super::event::Event;
use super::job::JobConfig;
use super::permission::Permission;
use super::systemd::SystemdHandler;
use crate::error::PlatformError;
use crate::exec::Executor;
use crate::platform::{Os, Platform};

/// Operations the job lifecycle needs from an OS scheduler.
///
/// Calls for one batch are bracketed by [`init`](Self::init) and
/// [`close`](Self::close) and are never made concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait Handler {
    /// Acquire backend-wide resources. Called once before any other operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the native scheduler is unavailable.
    fn init(&mut self) -> HandlerResult<()>;

    /// Release what [`init`](Self::init) acquired. Called once per batch, even
    /// when `init` or a job operation failed.
    fn close(&mut self);

    /// Map a requested permission onto one usable in the current context.
    ///
    /// The boolean is `false` when the result is a best-effort guess.
    fn detect_schedule_permission(&self, requested: Permission) -> (Permission, bool);

    /// Backend-specific feasibility check for `job` under `permission`.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment prevents the check itself.
    fn check_permission(&self, job: &JobConfig, permission: Permission) -> HandlerResult<bool>;

    /// Convert raw recurrence expressions into backend events.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::InvalidSchedule`](super::HandlerError::InvalidSchedule)
    /// for malformed expressions.
    fn parse_schedules(&self, schedules: &[String]) -> HandlerResult<Vec<Event>>;

    /// Present the schedules of one job.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedules cannot be presented.
    fn display_schedules(
        &self,
        profile: &str,
        command: &str,
        schedules: &[String],
    ) -> HandlerResult<()>;

    /// Install or replace the native scheduler entry for `job`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written or activated.
    fn create_job(
        &mut self,
        job: &JobConfig,
        events: &[Event],
        permission: Permission,
    ) -> HandlerResult<()>;

    /// Uninstall the native scheduler entry for `job`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotFound`](super::HandlerError::NotFound) when
    /// nothing is installed for the job, or another error if removal fails.
    fn remove_job(&mut self, job: &JobConfig, permission: Permission) -> HandlerResult<()>;

    /// Present the native scheduler state of one job.
    ///
    /// # Errors
    ///
    /// Returns an error if the native state cannot be queried.
    fn display_job_status(&self, job: &JobConfig) -> HandlerResult<()>;

    /// Present the aggregate state of every job of `profile`.
    ///
    /// # Errors
    ///
    /// Returns an error if the native state cannot be queried.
    fn display_status(&self, profile: &str) -> HandlerResult<()>;
}

/// Supported scheduler backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// systemd timers.
    Systemd,
    /// The invoking user's crontab.
    Crontab,
}

impl SchedulerKind {
    /// Parse a configured scheduler name. `None` means "detect".
    ///
    /// # Errors
    ///
    /// Returns an error for names that match no backend.
    pub fn from_name(name: &str) -> Result<Option<Self>, PlatformError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(None),
            "systemd" => Ok(Some(Self::Systemd)),
            "crontab" | "crond" | "cron" => Ok(Some(Self::Crontab)),
            other => Err(PlatformError::UnknownScheduler(other.to_string())),
        }
    }

    /// Pick the backend for `platform`.
    ///
    /// # Errors
    ///
    /// Returns an error on platforms without a supported scheduler.
    pub fn detect(platform: &Platform, executor: &dyn Executor) -> Result<Self, PlatformError> {
        match platform.os {
            Os::Windows => Err(PlatformError::Unsupported {
                platform: platform.os.to_string(),
            }),
            Os::Linux if executor.which("systemctl") => Ok(Self::Systemd),
            Os::Linux | Os::MacOs | Os::OtherUnix => Ok(Self::Crontab),
        }
    }

    /// Resolve the configured name, falling back to detection.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or unsupported platforms.
    pub fn resolve(
        name: Option<&str>,
        platform: &Platform,
        executor: &dyn Executor,
    ) -> Result<Self, PlatformError> {
        match name.map(Self::from_name).transpose()?.flatten() {
            Some(kind) if platform.os == Os::Windows => Err(PlatformError::Unsupported {
                platform: format!("{} ({kind})", platform.os),
            }),
            Some(kind) => Ok(kind),
            None => Self::detect(platform, executor),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Systemd => write!(f, "systemd"),
            Self::Crontab => write!(f, "crontab"),
        }
    }
}

/// Create the backend for `kind`.
#[must_use]
pub fn new_handler(
    kind: SchedulerKind,
    executor: Arc<dyn Executor>,
    platform: &Platform,
) -> Box<dyn Handler> {
    match kind {
        SchedulerKind::Systemd => Box::new(SystemdHandler::new(executor, platform.euid)),
        SchedulerKind::Crontab => Box::new(CrontabHandler::new(executor, platform.euid)),
    }
}
