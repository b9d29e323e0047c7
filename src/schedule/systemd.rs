//! systemd backend: one `.service` + `.timer` pair per job.
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{HandlerError, HandlerResult};
use super::event::Event;
use super::handler::Handler;
use super::job::{FLAG_AFTER_NETWORK_ONLINE, FLAG_NO_START, JobConfig};
use super::permission::Permission;
use crate::exec::{ExecResult, Executor};

/// Prefix shared by every unit this tool installs.
pub const UNIT_PREFIX: &str = "backup-scheduler";

/// Directory holding system-wide units.
const SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";

const SYSTEMCTL: &str = "systemctl";
const SYSTEMD_ANALYZE: &str = "systemd-analyze";

/// Unit file stem for a job: `backup-scheduler-<command>@profile-<profile>`.
#[must_use]
pub fn unit_stem(profile: &str, command: &str) -> String {
    format!("{UNIT_PREFIX}-{command}@profile-{profile}")
}

/// Service unit file name for a job.
#[must_use]
pub fn service_file(profile: &str, command: &str) -> String {
    format!("{}.service", unit_stem(profile, command))
}

/// Timer unit file name for a job.
#[must_use]
pub fn timer_file(profile: &str, command: &str) -> String {
    format!("{}.timer", unit_stem(profile, command))
}

/// Scope a unit is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    System,
    User,
}

impl Scope {
    const fn for_permission(permission: Permission) -> Option<Self> {
        match permission {
            Permission::System => Some(Self::System),
            Permission::UserBackground | Permission::UserLoggedOn => Some(Self::User),
            Permission::Auto => None,
        }
    }

    /// `systemctl` arguments selecting this scope, followed by `args`.
    fn args<'a>(self, args: &[&'a str]) -> Vec<&'a str> {
        let mut out = Vec::with_capacity(args.len() + 1);
        if self == Self::User {
            out.push("--user");
        }
        out.extend_from_slice(args);
        out
    }
}

/// [`Handler`] writing systemd units and driving them with `systemctl`.
#[derive(Debug)]
pub struct SystemdHandler {
    executor: Arc<dyn Executor>,
    euid: u32,
    system_dir: PathBuf,
    user_dir: Option<PathBuf>,
}

impl SystemdHandler {
    /// Create a handler for the process running as `euid`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, euid: u32) -> Self {
        Self {
            executor,
            euid,
            system_dir: PathBuf::from(SYSTEM_UNIT_DIR),
            user_dir: default_user_unit_dir(),
        }
    }

    /// Override the unit directories (used by tests and packaging).
    #[must_use]
    pub fn with_unit_dirs(mut self, system_dir: PathBuf, user_dir: PathBuf) -> Self {
        self.system_dir = system_dir;
        self.user_dir = Some(user_dir);
        self
    }

    fn unit_dir(&self, scope: Scope) -> HandlerResult<&Path> {
        match scope {
            Scope::System => Ok(&self.system_dir),
            Scope::User => self.user_dir.as_deref().ok_or_else(|| HandlerError::Unavailable {
                tool: "systemd user unit directory".to_string(),
                reason: "neither XDG_CONFIG_HOME nor HOME is set".to_string(),
            }),
        }
    }

    fn scope(permission: Permission) -> HandlerResult<Scope> {
        Scope::for_permission(permission).ok_or(HandlerError::UnsupportedPermission {
            permission,
            scheduler: "systemd",
        })
    }

    /// Scope where the job's timer is currently installed, system first.
    fn installed_scope(&self, job: &JobConfig) -> Option<Scope> {
        let timer = timer_file(&job.profile_name, &job.command_name);
        [Scope::System, Scope::User].into_iter().find(|scope| {
            self.unit_dir(*scope)
                .is_ok_and(|dir| dir.join(&timer).exists())
        })
    }

    fn systemctl(&self, scope: Scope, args: &[&str]) -> HandlerResult<ExecResult> {
        let args = scope.args(args);
        let result = self.executor.run_unchecked(SYSTEMCTL, &args)?;
        if result.success {
            Ok(result)
        } else {
            Err(HandlerError::ExecutionFailed {
                program: format!("{SYSTEMCTL} {}", args.join(" ")),
                exit_code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn enable_linger(&self) {
        match self.executor.run_unchecked("loginctl", &["enable-linger"]) {
            Ok(result) if result.success => {
                tracing::debug!("lingering enabled for the current user");
            }
            Ok(result) => tracing::warn!(
                "cannot enable lingering, the job will only run while you are logged on: {}",
                result.stderr.trim()
            ),
            Err(e) => tracing::warn!("cannot enable lingering: {e:#}"),
        }
    }
}

impl Handler for SystemdHandler {
    fn init(&mut self) -> HandlerResult<()> {
        if !self.executor.which(SYSTEMCTL) {
            return Err(HandlerError::Unavailable {
                tool: SYSTEMCTL.to_string(),
                reason: "not found on PATH".to_string(),
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        tracing::debug!("systemd handler closed");
    }

    fn detect_schedule_permission(&self, requested: Permission) -> (Permission, bool) {
        match requested {
            Permission::System | Permission::UserBackground | Permission::UserLoggedOn => {
                (requested, true)
            }
            Permission::Auto if self.euid == 0 => (Permission::System, true),
            Permission::Auto => (Permission::UserLoggedOn, false),
        }
    }

    fn check_permission(&self, _job: &JobConfig, permission: Permission) -> HandlerResult<bool> {
        if permission == Permission::Auto || !permission.is_granted(self.euid) {
            return Ok(false);
        }
        if permission.is_user() {
            let result = self
                .executor
                .run_unchecked(SYSTEMCTL, &["--user", "show-environment"])?;
            if !result.success {
                return Err(HandlerError::Unavailable {
                    tool: "systemd user instance".to_string(),
                    reason: result.stderr.trim().to_string(),
                });
            }
        }
        Ok(true)
    }

    fn parse_schedules(&self, schedules: &[String]) -> HandlerResult<Vec<Event>> {
        schedules
            .iter()
            .map(|expression| {
                let result = self
                    .executor
                    .run_unchecked(SYSTEMD_ANALYZE, &["calendar", expression])?;
                if !result.success {
                    return Err(HandlerError::InvalidSchedule {
                        expression: expression.clone(),
                        reason: result.stderr.trim().to_string(),
                    });
                }
                let normalized = normalized_form(&result.stdout).unwrap_or(expression);
                Ok(Event::new(expression.as_str(), normalized))
            })
            .collect()
    }

    fn display_schedules(
        &self,
        profile: &str,
        command: &str,
        schedules: &[String],
    ) -> HandlerResult<()> {
        for expression in schedules {
            tracing::info!("schedule {command}@{profile}: {expression}");
            let result = self
                .executor
                .run_unchecked(SYSTEMD_ANALYZE, &["calendar", "--iterations=3", expression])?;
            for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
                tracing::info!("  {}", line.trim_end());
            }
        }
        Ok(())
    }

    fn create_job(
        &mut self,
        job: &JobConfig,
        events: &[Event],
        permission: Permission,
    ) -> HandlerResult<()> {
        if events.is_empty() {
            return Err(HandlerError::InvalidSchedule {
                expression: String::new(),
                reason: format!("job {} has no schedule", job.name()),
            });
        }
        let scope = Self::scope(permission)?;
        let dir = self.unit_dir(scope)?.to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| HandlerError::io(&dir, e))?;

        let service = dir.join(service_file(&job.profile_name, &job.command_name));
        let timer_name = timer_file(&job.profile_name, &job.command_name);
        let timer = dir.join(&timer_name);
        fs::write(&service, render_service(job)).map_err(|e| HandlerError::io(&service, e))?;
        fs::write(&timer, render_timer(job, events)).map_err(|e| HandlerError::io(&timer, e))?;
        tracing::debug!("wrote {} and {}", service.display(), timer.display());

        self.systemctl(scope, &["daemon-reload"])?;
        if permission == Permission::UserBackground {
            self.enable_linger();
        }
        if job.has_flag(FLAG_NO_START) {
            self.systemctl(scope, &["enable", &timer_name])?;
        } else {
            self.systemctl(scope, &["enable", "--now", &timer_name])?;
        }
        Ok(())
    }

    fn remove_job(&mut self, job: &JobConfig, permission: Permission) -> HandlerResult<()> {
        let scope = Self::scope(permission)?;
        let dir = self.unit_dir(scope)?.to_path_buf();
        let timer_name = timer_file(&job.profile_name, &job.command_name);
        let timer = dir.join(&timer_name);
        if !timer.exists() {
            return Err(HandlerError::NotFound);
        }

        // Unit files stay in place while the timer is still loaded.
        self.systemctl(scope, &["disable", "--now", &timer_name])?;
        let service = dir.join(service_file(&job.profile_name, &job.command_name));
        for path in [&timer, &service] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(HandlerError::io(path, e)),
            }
        }
        self.systemctl(scope, &["daemon-reload"])?;
        Ok(())
    }

    fn display_job_status(&self, job: &JobConfig) -> HandlerResult<()> {
        let Some(scope) = self.installed_scope(job) else {
            tracing::warn!("job {} is not installed", job.name());
            return Ok(());
        };
        let timer_name = timer_file(&job.profile_name, &job.command_name);
        let result = self
            .executor
            .run_unchecked(SYSTEMCTL, &scope.args(&["status", "--no-pager", &timer_name]))?;
        for line in result.stdout.lines() {
            tracing::info!("{line}");
        }
        Ok(())
    }

    fn display_status(&self, profile: &str) -> HandlerResult<()> {
        let pattern = format!("{UNIT_PREFIX}-*@profile-{profile}.timer");
        for scope in [Scope::System, Scope::User] {
            let args = scope.args(&["list-timers", "--all", "--no-pager", &pattern]);
            let result = self.executor.run_unchecked(SYSTEMCTL, &args)?;
            if !result.success {
                tracing::debug!("{SYSTEMCTL} {}: {}", args.join(" "), result.stderr.trim());
                continue;
            }
            for line in result.stdout.lines() {
                tracing::info!("{line}");
            }
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/systemd/user`, falling back to `~/.config/systemd/user`.
fn default_user_unit_dir() -> Option<PathBuf> {
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(config_home.join("systemd").join("user"))
}

/// Extract the `Normalized form:` line of `systemd-analyze calendar` output.
fn normalized_form(stdout: &str) -> Option<&str> {
    stdout.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Normalized form:")
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

fn render_service(job: &JobConfig) -> String {
    let mut unit = String::new();
    let _ = writeln!(unit, "[Unit]");
    let _ = writeln!(
        unit,
        "Description={} job for profile {}",
        job.command_name, job.profile_name
    );
    if job.has_flag(FLAG_AFTER_NETWORK_ONLINE) {
        let _ = writeln!(unit, "After=network-online.target");
        let _ = writeln!(unit, "Wants=network-online.target");
    }
    let _ = writeln!(unit);
    let _ = writeln!(unit, "[Service]");
    let _ = writeln!(unit, "Type=oneshot");
    if let Some(dir) = job.working_directory() {
        let _ = writeln!(
            unit,
            "WorkingDirectory={}",
            escape_specifiers(&dir.display().to_string())
        );
    }
    let _ = writeln!(unit, "ExecStart={}", escape_specifiers(&job.command_line()));
    unit
}

/// systemd expands `%` specifiers in unit settings.
fn escape_specifiers(value: &str) -> String {
    value.replace('%', "%%")
}

fn render_timer(job: &JobConfig, events: &[Event]) -> String {
    let mut unit = String::new();
    let _ = writeln!(unit, "[Unit]");
    let _ = writeln!(
        unit,
        "Description=timer for {} job of profile {}",
        job.command_name, job.profile_name
    );
    let _ = writeln!(unit);
    let _ = writeln!(unit, "[Timer]");
    for event in events {
        let _ = writeln!(unit, "OnCalendar={}", event.native());
    }
    let _ = writeln!(
        unit,
        "Unit={}",
        service_file(&job.profile_name, &job.command_name)
    );
    let _ = writeln!(unit, "Persistent=true");
    let _ = writeln!(unit);
    let _ = writeln!(unit, "[Install]");
    let _ = writeln!(unit, "WantedBy=timers.target");
    unit
}
