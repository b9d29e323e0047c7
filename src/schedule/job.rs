//! Description of one schedulable job.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::arguments::CommandArguments;
use super::permission::Permission;

/// Flag asking the backend not to start the schedule right after installing it.
pub const FLAG_NO_START: &str = "no-start";

/// Flag asking the backend to delay the job until the network is online.
pub const FLAG_AFTER_NETWORK_ONLINE: &str = "after-network-online";

/// Subcommand of the scheduled executable that runs one job.
pub const RUN_SCHEDULE_COMMAND: &str = "run-schedule";

/// One schedulable unit, identified by its `(profile, command)` pair.
///
/// A job without schedules is *removal-only*: it exists to clean up a schedule
/// that was installed earlier but no longer appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Profile the job belongs to.
    pub profile_name: String,
    /// Command of the profile being scheduled (`backup`, `check`, …).
    pub command_name: String,
    /// Executable the scheduler invokes.
    pub command: PathBuf,
    /// Arguments passed to [`command`](Self::command).
    pub arguments: CommandArguments,
    /// Requested permission (possibly [`Permission::Auto`]).
    pub permission: Permission,
    /// Backend hints such as [`FLAG_NO_START`].
    pub flags: BTreeMap<String, String>,
    /// Raw recurrence expressions, in configuration order.
    pub schedules: Vec<String>,
    /// Configuration file the scheduled invocation reads.
    pub config_file: PathBuf,
}

impl JobConfig {
    /// Build a job whose invocation re-runs `command@profile` from `config_file`.
    ///
    /// The argument vector is
    /// `--no-ansi --config <config_file> run-schedule <command>@<profile>`.
    pub fn new(
        profile_name: impl Into<String>,
        command_name: impl Into<String>,
        executable: impl Into<PathBuf>,
        config_file: impl Into<PathBuf>,
        schedules: Vec<String>,
    ) -> Self {
        let profile_name = profile_name.into();
        let command_name = command_name.into();
        let config_file = config_file.into();
        let arguments = CommandArguments::new([
            "--no-ansi".to_string(),
            "--config".to_string(),
            config_file.to_string_lossy().into_owned(),
            RUN_SCHEDULE_COMMAND.to_string(),
            format!("{command_name}@{profile_name}"),
        ]);
        Self {
            profile_name,
            command_name,
            command: executable.into(),
            arguments,
            permission: Permission::Auto,
            flags: BTreeMap::new(),
            schedules,
            config_file,
        }
    }

    /// Set the requested permission.
    #[must_use]
    pub const fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Add a backend flag.
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    /// Display name, `command@profile`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}@{}", self.command_name, self.profile_name)
    }

    /// `true` when the job carries no schedule and may only be removed.
    #[must_use]
    pub fn is_remove_only(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Whether flag `name` is set.
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Full command line the scheduler runs, with quoting applied.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.arguments.command_line(&self.command)
    }

    /// Directory the scheduled command should run from.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.config_file.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(schedules: &[&str]) -> JobConfig {
        JobConfig::new(
            "profile",
            "backup",
            "/usr/local/bin/resticprofile",
            "config file",
            schedules.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn arguments_rerun_the_job_from_its_config() {
        let job = job(&["daily"]);
        assert_eq!(
            job.arguments.raw_args(),
            [
                "--no-ansi",
                "--config",
                "config file",
                "run-schedule",
                "backup@profile"
            ]
        );
        assert_eq!(
            job.arguments.to_string(),
            r#"--no-ansi --config "config file" run-schedule backup@profile"#
        );
    }

    #[test]
    fn name_is_command_at_profile() {
        assert_eq!(job(&[]).name(), "backup@profile");
    }

    #[test]
    fn remove_only_without_schedules() {
        assert!(job(&[]).is_remove_only());
        assert!(!job(&["daily"]).is_remove_only());
    }

    #[test]
    fn defaults_to_auto_permission() {
        assert_eq!(job(&[]).permission, Permission::Auto);
        let job = job(&[]).with_permission(Permission::System);
        assert_eq!(job.permission, Permission::System);
    }

    #[test]
    fn flags() {
        let job = job(&["daily"]).with_flag(FLAG_NO_START, "");
        assert!(job.has_flag(FLAG_NO_START));
        assert_eq!(job.flags.get(FLAG_NO_START).map(String::as_str), Some(""));
        assert!(!job.has_flag(FLAG_AFTER_NETWORK_ONLINE));
    }

    #[test]
    fn command_line_includes_executable() {
        assert_eq!(
            job(&["daily"]).command_line(),
            r#"/usr/local/bin/resticprofile --no-ansi --config "config file" run-schedule backup@profile"#
        );
    }

    #[test]
    fn working_directory_is_config_parent() {
        let job = JobConfig::new("p", "backup", "/bin/x", "/etc/backup/conf.toml", vec![]);
        assert_eq!(job.working_directory(), Some(Path::new("/etc/backup")));
        assert_eq!(self::job(&[]).working_directory(), None);
    }
}
