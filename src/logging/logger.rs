//! Structured logger with job result collection for the run summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::STAGE_TARGET;
use super::utils::log_file_path;

/// Outcome of one job within a command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The scheduler accepted the change.
    Ok,
    /// The job was not processed because an earlier job in its batch failed.
    Skipped,
    /// The change was rejected.
    Failed,
}

/// Job result for summary reporting.
#[derive(Debug, Clone)]
pub struct JobEntry {
    /// Job name, `command@profile`.
    pub name: String,
    /// Final status.
    pub status: JobStatus,
    /// Optional detail (e.g. the error).
    pub message: Option<String>,
}

/// Structured logger with summary collection.
///
/// All messages are also written to a persistent log file at
/// `$XDG_CACHE_HOME/backup-scheduler/<command>.log` by the
/// [`FileLayer`](super::subscriber::FileLayer) installed by
/// [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug)]
pub struct Logger {
    jobs: Mutex<Vec<JobEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger for `command`; does not touch the log file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only when verbose; always in the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a job result for the summary.
    pub fn record_job(&self, name: &str, status: JobStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.jobs.lock() {
            guard.push(JobEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Return a copy of all recorded job entries.
    #[must_use]
    pub fn job_entries(&self) -> Vec<JobEntry> {
        self.jobs.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Count the number of failed jobs.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.jobs.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|j| j.status == JobStatus::Failed)
                .count()
        })
    }

    /// Log the summary of all recorded jobs.
    pub fn print_summary(&self) {
        let jobs = self.job_entries();
        if jobs.is_empty() {
            return;
        }

        self.stage("Summary");
        let (mut ok, mut skipped, mut failed) = (0u32, 0u32, 0u32);
        for job in &jobs {
            let icon = match job.status {
                JobStatus::Ok => {
                    ok += 1;
                    "\x1b[32m✓\x1b[0m"
                }
                JobStatus::Skipped => {
                    skipped += 1;
                    "\x1b[2m·\x1b[0m"
                }
                JobStatus::Failed => {
                    failed += 1;
                    "\x1b[31m✗\x1b[0m"
                }
            };
            match &job.message {
                Some(msg) => self.info(&format!("{icon} {} ({msg})", job.name)),
                None => self.info(&format!("{icon} {}", job.name)),
            }
        }
        self.info(&format!("{ok} ok, {skipped} skipped, {failed} failed"));
        if let Some(path) = &self.log_file {
            self.info(&format!("Log file: {}", path.display()));
        }
    }
}
