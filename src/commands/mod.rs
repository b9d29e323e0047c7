pub mod completions;
pub mod schedule;
pub mod status;
pub mod unschedule;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{JobStatus, Logger};
use crate::platform::Platform;
use crate::schedule::{Handler, JobConfig, JobError, SchedulerKind, new_handler};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, configuration loading and scheduler
/// selection so that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected host.
    pub platform: Platform,
    /// Loaded configuration.
    pub config: Config,
    /// Canonical path of the config file, recorded in every job.
    pub config_file: PathBuf,
    /// Executable recorded in jobs that are removed or reported. Falls back to
    /// this program when `global.executable` is unset, since neither removal
    /// nor status runs it.
    pub executable: PathBuf,
    /// Scheduler backend selected for this run.
    pub scheduler: SchedulerKind,
    executor: Arc<dyn Executor>,
}

impl CommandSetup {
    /// Detect the platform, load the configuration, and pick the scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be found or parsed, the
    /// executable path cannot be determined, or no scheduler is usable.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        log.debug(&format!("platform: {} (euid {})", platform.os, platform.euid));

        log.stage("Loading configuration");
        let config_file = dunce::canonicalize(&global.config).with_context(|| {
            format!("cannot find config file {}", global.config.display())
        })?;
        let config = Config::load(&config_file)?;
        log.info(&format!("config: {}", config_file.display()));
        log.debug(&format!("{} profile(s) defined", config.profiles.len()));

        // Validate configuration and display warnings
        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        let executable = match &config.global.executable {
            Some(path) => path.clone(),
            None => {
                std::env::current_exe().context("cannot determine the path of this program")?
            }
        };

        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let requested = global
            .scheduler
            .as_deref()
            .or(config.global.scheduler.as_deref());
        let scheduler = SchedulerKind::resolve(requested, &platform, executor.as_ref())?;
        log.info(&format!("scheduler: {scheduler}"));

        Ok(Self {
            platform,
            config,
            config_file,
            executable,
            scheduler,
            executor,
        })
    }

    /// Create the backend selected for this run.
    #[must_use]
    pub fn handler(&self) -> Box<dyn Handler> {
        new_handler(self.scheduler, Arc::clone(&self.executor), &self.platform)
    }
}

/// Split `jobs` into batches sharing the same requested permission, keeping
/// the order in which permissions first appear and the job order within each.
#[must_use]
pub fn permission_batches(jobs: &[JobConfig]) -> Vec<Vec<JobConfig>> {
    let mut batches: Vec<Vec<JobConfig>> = Vec::new();
    for job in jobs {
        match batches
            .iter_mut()
            .find(|batch| batch.first().is_some_and(|j| j.permission == job.permission))
        {
            Some(batch) => batch.push(job.clone()),
            None => batches.push(vec![job.clone()]),
        }
    }
    batches
}

/// Run `op` over each permission batch, record every job in the summary, and
/// stop at the first failing batch.
///
/// # Errors
///
/// Returns the first batch failure.
pub fn run_batches(
    jobs: &[JobConfig],
    log: &Logger,
    mut op: impl FnMut(&[JobConfig]) -> Result<(), JobError>,
) -> Result<()> {
    let batches = permission_batches(jobs);
    let mut failure = None;
    for batch in &batches {
        if failure.is_some() {
            for job in batch {
                log.record_job(&job.name(), JobStatus::Skipped, None);
            }
            continue;
        }
        let result = op(batch);
        record_batch(log, batch, result.as_ref().err());
        if let Err(e) = result {
            failure = Some(e);
        }
    }

    log.print_summary();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Record the outcome of one fail-fast batch: jobs before the failing one
/// succeeded, jobs after it were never attempted.
fn record_batch(log: &Logger, batch: &[JobConfig], error: Option<&JobError>) {
    let Some(error) = error else {
        for job in batch {
            log.record_job(&job.name(), JobStatus::Ok, None);
        }
        return;
    };

    let message = error.to_string();
    let failed = error.job();
    let mut seen_failure = failed.is_none();
    for job in batch {
        let name = job.name();
        if seen_failure {
            log.record_job(&name, JobStatus::Skipped, None);
        } else if failed == Some(name.as_str()) {
            seen_failure = true;
            log.record_job(&name, JobStatus::Failed, Some(&message));
        } else {
            log.record_job(&name, JobStatus::Ok, None);
        }
    }
    if failed.is_none() {
        log.error(&message);
    }
}
