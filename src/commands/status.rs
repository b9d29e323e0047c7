//! Command: show the scheduled jobs of a profile.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::schedule::{Handler, JobConfig, status_jobs};

/// Run the status command.
///
/// # Errors
///
/// Returns an error if setup fails, the profile is unknown, or the scheduler
/// state cannot be displayed.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let profile = setup.config.require_profile(&global.name)?;
    let jobs = profile.scheduled_jobs(&global.name, &setup.executable, &setup.config_file);

    let mut handler = setup.handler();
    execute(handler.as_mut(), &global.name, &jobs, log)
}

/// Display the status of `jobs` and of `profile` with `handler`.
///
/// # Errors
///
/// Returns the first display failure.
pub fn execute(
    handler: &mut dyn Handler,
    profile: &str,
    jobs: &[JobConfig],
    log: &Logger,
) -> Result<()> {
    log.stage(&format!("Status of profile {profile}"));
    if jobs.is_empty() {
        log.info(&format!("no schedule found for profile {profile}"));
    }
    status_jobs(handler, profile, jobs)?;
    Ok(())
}
