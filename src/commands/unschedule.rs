//! Command: remove the scheduled jobs of a profile.
use anyhow::Result;

use super::{CommandSetup, run_batches};
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::schedule::{Handler, JobConfig, remove_jobs};

/// Run the unschedule command.
///
/// Every schedulable command of the profile is removed, including commands
/// whose schedule was deleted from the config since they were installed.
///
/// # Errors
///
/// Returns an error if setup fails, the profile is unknown, or a job cannot
/// be removed.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let profile = setup.config.require_profile(&global.name)?;
    let jobs = profile.removable_jobs(&global.name, &setup.executable, &setup.config_file);

    let mut handler = setup.handler();
    execute(handler.as_mut(), &jobs, log)
}

/// Remove `jobs` with `handler`, one batch per requested permission.
///
/// # Errors
///
/// Returns the first job failure.
pub fn execute(handler: &mut dyn Handler, jobs: &[JobConfig], log: &Logger) -> Result<()> {
    log.stage(&format!("Removing {} job(s)", jobs.len()));
    run_batches(jobs, log, |batch| remove_jobs(&mut *handler, batch))
}
