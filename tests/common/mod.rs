// Shared helpers for integration tests.
//
// Provides a temporary config file, an in-memory crontab standing in for the
// `crontab` program, and a handler that records every call it receives.
#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, bail};
use backup_scheduler::config::Config;
use backup_scheduler::exec::{ExecResult, Executor};
use backup_scheduler::schedule::{
    Event, Handler, HandlerError, HandlerResult, JobConfig, Permission,
};

/// Executable recorded in every job built by the tests.
pub const EXECUTABLE: &str = "/usr/local/bin/backup-scheduler";

/// A config file written into a [`tempfile::TempDir`].
pub struct ConfigFixture {
    /// Directory holding the config file; deleted on drop.
    pub dir: tempfile::TempDir,
    /// Path of the config file.
    pub path: PathBuf,
}

impl ConfigFixture {
    /// Write `content` to `<tempdir>/<file_name>`.
    pub fn new(file_name: &str, content: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(file_name);
        std::fs::write(&path, content).expect("write config file");
        Self { dir, path }
    }

    /// Load the config file.
    pub fn load(&self) -> Config {
        Config::load(&self.path).expect("load config")
    }

    /// Jobs to install for `profile`.
    pub fn scheduled_jobs(&self, profile: &str) -> Vec<JobConfig> {
        self.load()
            .require_profile(profile)
            .expect("profile exists")
            .scheduled_jobs(profile, Path::new(EXECUTABLE), &self.path)
    }

    /// Jobs to remove for `profile`.
    pub fn removable_jobs(&self, profile: &str) -> Vec<JobConfig> {
        self.load()
            .require_profile(profile)
            .expect("profile exists")
            .removable_jobs(profile, Path::new(EXECUTABLE), &self.path)
    }
}

/// [`Executor`] emulating `crontab -l` and `crontab -` on an in-memory table.
///
/// Any other program fails as if it were not installed.
#[derive(Debug, Default)]
pub struct FakeCrontab {
    table: Mutex<Option<String>>,
}

impl FakeCrontab {
    /// Start with no crontab for the user.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start with an existing crontab.
    pub fn with_table(content: &str) -> Self {
        Self {
            table: Mutex::new(Some(content.to_string())),
        }
    }

    /// Current content, empty when no crontab was ever installed.
    pub fn content(&self) -> String {
        self.table
            .lock()
            .expect("lock table")
            .clone()
            .unwrap_or_default()
    }
}

fn ok(stdout: &str) -> ExecResult {
    ExecResult {
        stdout: stdout.to_string(),
        stderr: String::new(),
        success: true,
        code: Some(0),
    }
}

impl Executor for FakeCrontab {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        if program != "crontab" || args != ["-l"] {
            bail!("{program} is not available");
        }
        match self.table.lock().expect("lock table").as_deref() {
            Some(content) => Ok(ok(content)),
            None => Ok(ExecResult {
                stdout: String::new(),
                stderr: "no crontab for tester\n".to_string(),
                success: false,
                code: Some(1),
            }),
        }
    }

    fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<ExecResult> {
        if program != "crontab" || args != ["-"] {
            bail!("{program} is not available");
        }
        *self.table.lock().expect("lock table") = Some(input.to_string());
        Ok(ok(""))
    }

    fn which(&self, program: &str) -> bool {
        program == "crontab"
    }
}

/// [`Handler`] that accepts everything and records each call as a line.
///
/// Jobs listed in `installed` are the ones [`Handler::remove_job`] and
/// [`Handler::display_job_status`] find; `fail_create` names a job whose
/// creation fails.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: RefCell<Vec<String>>,
    pub installed: Vec<String>,
    pub fail_create: Option<String>,
    pub permission: Option<Permission>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail [`Handler::create_job`] for the job named `name`.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_create: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Handler for RecordingHandler {
    fn init(&mut self) -> HandlerResult<()> {
        self.record("init".to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.record("close".to_string());
    }

    fn detect_schedule_permission(&self, requested: Permission) -> (Permission, bool) {
        match requested {
            Permission::Auto => (Permission::UserBackground, false),
            other => (other, true),
        }
    }

    fn check_permission(&self, _job: &JobConfig, permission: Permission) -> HandlerResult<bool> {
        Ok(permission != Permission::System)
    }

    fn parse_schedules(&self, schedules: &[String]) -> HandlerResult<Vec<Event>> {
        Ok(schedules
            .iter()
            .map(|s| Event::new(s.as_str(), s.as_str()))
            .collect())
    }

    fn display_schedules(
        &self,
        profile: &str,
        command: &str,
        _schedules: &[String],
    ) -> HandlerResult<()> {
        self.record(format!("schedules {command}@{profile}"));
        Ok(())
    }

    fn create_job(
        &mut self,
        job: &JobConfig,
        events: &[Event],
        permission: Permission,
    ) -> HandlerResult<()> {
        self.record(format!(
            "create {} {} x{}",
            job.name(),
            permission,
            events.len()
        ));
        self.permission = Some(permission);
        if self.fail_create.as_deref() == Some(job.name().as_str()) {
            return Err(HandlerError::Unavailable {
                tool: "recorder".to_string(),
                reason: "refused".to_string(),
            });
        }
        self.installed.push(job.name());
        Ok(())
    }

    fn remove_job(&mut self, job: &JobConfig, _permission: Permission) -> HandlerResult<()> {
        let name = job.name();
        let Some(index) = self.installed.iter().position(|n| *n == name) else {
            return Err(HandlerError::NotFound);
        };
        self.installed.remove(index);
        self.record(format!("remove {name}"));
        Ok(())
    }

    fn display_job_status(&self, job: &JobConfig) -> HandlerResult<()> {
        self.record(format!("status {}", job.name()));
        if self.installed.contains(&job.name()) {
            Ok(())
        } else {
            Err(HandlerError::NotFound)
        }
    }

    fn display_status(&self, profile: &str) -> HandlerResult<()> {
        self.record(format!("status of {profile}"));
        Ok(())
    }
}
