//! Install, remove and report batches of jobs against one [`Handler`].
//!
//! Every entry point brackets the whole batch with [`Handler::init`] and
//! [`Handler::close`] and processes jobs strictly in the order given. Batches
//! are fail-fast and not transactional: when a job fails, jobs earlier in the
//! batch stay installed (or removed) and later jobs are not attempted.
use std::ops::{Deref, DerefMut};

use super::error::{HandlerError, JobError};
use super::handler::Handler;
use super::job::JobConfig;
use super::permission::Permission;

/// Exclusive use of a handler for one batch; closes the handler when dropped.
struct HandlerSession<'a> {
    handler: &'a mut dyn Handler,
}

impl<'a> HandlerSession<'a> {
    /// Initialise `handler`. The returned session, or the failed attempt,
    /// always ends with exactly one [`Handler::close`].
    fn open(handler: &'a mut dyn Handler) -> Result<Self, JobError> {
        let session = Self { handler };
        session.handler.init().map_err(JobError::Init)?;
        Ok(session)
    }

    /// Resolve the permission used for every job of the batch from the first
    /// job's request.
    fn resolve_permission(&self, first: &JobConfig) -> Permission {
        let (permission, confirmed) = self.handler.detect_schedule_permission(first.permission);
        if !confirmed {
            tracing::warn!(
                "no schedule permission specified for {} (\"system\", \"user\" or \"user_logged_on\"): assuming \"{permission}\"",
                first.name()
            );
        }
        permission
    }
}

impl Drop for HandlerSession<'_> {
    fn drop(&mut self) {
        self.handler.close();
    }
}

impl<'a> Deref for HandlerSession<'a> {
    type Target = dyn Handler + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.handler
    }
}

impl DerefMut for HandlerSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.handler
    }
}

/// Install every job of the batch.
///
/// # Errors
///
/// Returns the first failure: backend initialisation, an infeasible permission,
/// a malformed schedule, or a failed installation.
pub fn schedule_jobs(handler: &mut dyn Handler, jobs: &[JobConfig]) -> Result<(), JobError> {
    let mut handler = HandlerSession::open(handler)?;
    let Some(first) = jobs.first() else {
        return Ok(());
    };
    let permission = handler.resolve_permission(first);

    for job in jobs {
        ensure_permission(&*handler, job, permission, "create")?;

        let events = handler
            .parse_schedules(&job.schedules)
            .map_err(|source| JobError::Parse {
                job: job.name(),
                source,
            })?;

        handler
            .display_schedules(&job.profile_name, &job.command_name, &job.schedules)
            .map_err(|source| JobError::Display {
                job: job.name(),
                source,
            })?;

        handler
            .create_job(job, &events, permission)
            .map_err(|source| JobError::Create {
                job: job.name(),
                source,
            })?;
        tracing::info!("scheduled job {} created", job.name());
    }
    Ok(())
}

/// Remove every job of the batch.
///
/// Jobs that are not installed are skipped. Only removal-only jobs are
/// checked for permission first: a configured job was installed, which
/// already proved it feasible.
///
/// # Errors
///
/// Returns the first failure other than [`HandlerError::NotFound`].
pub fn remove_jobs(handler: &mut dyn Handler, jobs: &[JobConfig]) -> Result<(), JobError> {
    let mut handler = HandlerSession::open(handler)?;
    let Some(first) = jobs.first() else {
        return Ok(());
    };
    let permission = handler.resolve_permission(first);

    for job in jobs {
        if job.is_remove_only() {
            ensure_permission(&*handler, job, permission, "remove")?;
        }

        match handler.remove_job(job, permission) {
            Ok(()) => tracing::info!("scheduled job {} removed", job.name()),
            Err(HandlerError::NotFound) => {
                tracing::debug!("no scheduled job {} found", job.name());
            }
            Err(source) => {
                return Err(JobError::Remove {
                    job: job.name(),
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Report the schedules and native state of every job, then the profile summary.
///
/// # Errors
///
/// Returns [`JobError::RemoveOnly`] when the batch holds a removal-only job,
/// or the first presentation failure.
pub fn status_jobs(
    handler: &mut dyn Handler,
    profile: &str,
    jobs: &[JobConfig],
) -> Result<(), JobError> {
    let handler = HandlerSession::open(handler)?;

    for job in jobs {
        if job.is_remove_only() {
            return Err(JobError::RemoveOnly { job: job.name() });
        }
        handler
            .display_schedules(&job.profile_name, &job.command_name, &job.schedules)
            .map_err(|source| JobError::Display {
                job: job.name(),
                source,
            })?;
        handler.display_job_status(job).map_err(JobError::Status)?;
    }

    handler.display_status(profile).map_err(JobError::Status)
}

fn ensure_permission(
    handler: &dyn Handler,
    job: &JobConfig,
    permission: Permission,
    action: &'static str,
) -> Result<(), JobError> {
    match handler.check_permission(job, permission) {
        Ok(true) => Ok(()),
        Ok(false) => Err(JobError::PermissionDenied {
            job: job.name(),
            action,
            permission,
        }),
        Err(source) => Err(JobError::PermissionCheck {
            job: job.name(),
            source,
        }),
    }
}
