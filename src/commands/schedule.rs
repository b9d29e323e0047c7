//! Command: install the scheduled jobs of a profile.
use anyhow::Result;
use std::path::Path;

use super::{CommandSetup, run_batches};
use crate::cli::GlobalOpts;
use crate::envscanner::scan_for_env_variables;
use crate::logging::Logger;
use crate::schedule::{Handler, JobConfig, schedule_jobs};

/// Run the schedule command.
///
/// # Errors
///
/// Returns an error if setup fails, the profile is unknown, `global.executable`
/// is unset, or a job cannot be installed.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let profile = setup.config.require_profile(&global.name)?;
    let executable = setup.config.require_executable()?;
    warn_missing_env(&setup.config_file, &global.name, log);

    let jobs = profile.scheduled_jobs(&global.name, executable, &setup.config_file);
    if jobs.is_empty() {
        log.warn(&format!("no schedule found for profile {}", global.name));
        return Ok(());
    }

    let mut handler = setup.handler();
    execute(handler.as_mut(), &jobs, log)
}

/// Install `jobs` with `handler`, one batch per requested permission.
///
/// # Errors
///
/// Returns the first job failure.
pub fn execute(handler: &mut dyn Handler, jobs: &[JobConfig], log: &Logger) -> Result<()> {
    log.stage(&format!("Scheduling {} job(s)", jobs.len()));
    run_batches(jobs, log, |batch| schedule_jobs(&mut *handler, batch))
}

/// Warn about `.Env.NAME` placeholders the current environment does not define.
fn warn_missing_env(config_file: &Path, profile: &str, log: &Logger) {
    match scan_for_env_variables(config_file, profile) {
        Ok(names) => {
            for name in names
                .iter()
                .filter(|name| std::env::var_os(name.as_str()).is_none())
            {
                log.warn(&format!(
                    "profile {profile} uses environment variable {name} which is not set in the current environment"
                ));
            }
        }
        Err(e) => log.debug(&format!("cannot scan for environment variables: {e:#}")),
    }
}
