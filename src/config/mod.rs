//! Profile configuration: schedules per command, turned into jobs.
pub mod loader;
/// Non-fatal checks on a loaded config.
pub mod validation;

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schedule::{JobConfig, Permission};

/// Commands that can carry a schedule, in the order jobs are produced.
pub const SCHEDULABLE_COMMANDS: &[&str] = &["backup", "check", "forget", "prune", "copy"];

/// The `[global]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalSection {
    /// Scheduler backend name (`auto`, `systemd`, `crontab`).
    pub scheduler: Option<String>,
    /// Executable the scheduled jobs invoke.
    pub executable: Option<PathBuf>,
}

/// Scheduling settings of one command inside a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommandSchedule {
    /// Recurrence expressions; a single string is accepted.
    #[serde(deserialize_with = "one_or_many")]
    pub schedule: Vec<String>,
    /// Permission token (`auto`, `system`, `user`, `user_logged_on`).
    pub schedule_permission: Option<String>,
    /// Backend flags such as `no-start`.
    pub schedule_flags: BTreeMap<String, String>,
}

impl CommandSchedule {
    /// Requested permission; missing or unknown tokens mean [`Permission::Auto`].
    #[must_use]
    pub fn permission(&self) -> Permission {
        self.schedule_permission
            .as_deref()
            .map_or(Permission::Auto, Permission::from_token)
    }
}

/// Schedulable commands of one profile. Unrelated profile keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileSchedules {
    /// `backup` schedule.
    pub backup: Option<CommandSchedule>,
    /// `check` schedule.
    pub check: Option<CommandSchedule>,
    /// `forget` schedule.
    pub forget: Option<CommandSchedule>,
    /// `prune` schedule.
    pub prune: Option<CommandSchedule>,
    /// `copy` schedule.
    pub copy: Option<CommandSchedule>,
}

impl ProfileSchedules {
    /// Settings of `command`, if the profile defines them.
    #[must_use]
    pub fn command(&self, command: &str) -> Option<&CommandSchedule> {
        match command {
            "backup" => self.backup.as_ref(),
            "check" => self.check.as_ref(),
            "forget" => self.forget.as_ref(),
            "prune" => self.prune.as_ref(),
            "copy" => self.copy.as_ref(),
            _ => None,
        }
    }

    /// Jobs for every command with at least one schedule.
    #[must_use]
    pub fn scheduled_jobs(
        &self,
        profile: &str,
        executable: &Path,
        config_file: &Path,
    ) -> Vec<JobConfig> {
        SCHEDULABLE_COMMANDS
            .iter()
            .filter_map(|command| {
                let settings = self.command(command)?;
                (!settings.schedule.is_empty())
                    .then(|| build_job(profile, command, Some(settings), executable, config_file))
            })
            .collect()
    }

    /// One job per schedulable command; unscheduled commands yield removal-only jobs.
    #[must_use]
    pub fn removable_jobs(
        &self,
        profile: &str,
        executable: &Path,
        config_file: &Path,
    ) -> Vec<JobConfig> {
        SCHEDULABLE_COMMANDS
            .iter()
            .map(|command| {
                build_job(profile, command, self.command(command), executable, config_file)
            })
            .collect()
    }
}

fn build_job(
    profile: &str,
    command: &str,
    settings: Option<&CommandSchedule>,
    executable: &Path,
    config_file: &Path,
) -> JobConfig {
    let schedules = settings.map(|s| s.schedule.clone()).unwrap_or_default();
    let mut job = JobConfig::new(profile, command, executable, config_file, schedules);
    if let Some(settings) = settings {
        job = job.with_permission(settings.permission());
        for (name, value) in &settings.schedule_flags {
            job = job.with_flag(name, value);
        }
    }
    job
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    global: GlobalSection,
    profiles: BTreeMap<String, ProfileSchedules>,
}

/// A loaded config file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path the config was read from.
    pub path: PathBuf,
    /// The `[global]` section.
    pub global: GlobalSection,
    /// Profiles by name.
    pub profiles: BTreeMap<String, ProfileSchedules>,
}

impl Config {
    /// Load a TOML or YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported or the file cannot be
    /// read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = loader::load_config(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            global: raw.global,
            profiles: raw.profiles,
        })
    }

    /// Schedules of profile `name`, if defined.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ProfileSchedules> {
        self.profiles.get(name)
    }

    /// Schedules of profile `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] when the profile is not defined.
    pub fn require_profile(&self, name: &str) -> Result<&ProfileSchedules, ConfigError> {
        self.profile(name).ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
            available: self
                .profiles
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// The executable installed jobs invoke with `run-schedule <command>@<profile>`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingExecutable`] when `global.executable` is unset.
    pub fn require_executable(&self) -> Result<&Path, ConfigError> {
        self.global
            .executable
            .as_deref()
            .ok_or_else(|| ConfigError::MissingExecutable {
                path: self.path.display().to_string(),
            })
    }

    /// Validate the configuration and return any warnings found.
    #[must_use]
    pub fn validate(&self) -> Vec<validation::ValidationWarning> {
        validation::validate(self)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::schedule::job::FLAG_NO_START;

    const TOML: &str = r#"
[global]
scheduler = "crontab"
executable = "/usr/local/bin/resticprofile"

[profiles.home]
repository = "/srv/backup"

[profiles.home.backup]
schedule = ["*-*-* 03:00:00", "Sun 12:00"]
schedule-permission = "user"
schedule-flags = { no-start = "" }
source = ["/home"]

[profiles.home.check]
schedule = "weekly"

[profiles.home.prune]
schedule-permission = "system"

[profiles.root]
"#;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn load(content: &str) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "profiles.toml", content);
        let config = Config::load(&path).unwrap();
        (dir, config)
    }

    #[test]
    fn load_global_section() {
        let (_dir, config) = load(TOML);
        assert_eq!(config.global.scheduler.as_deref(), Some("crontab"));
        assert_eq!(
            config.global.executable.as_deref(),
            Some(Path::new("/usr/local/bin/resticprofile"))
        );
    }

    #[test]
    fn scheduling_requires_an_executable() {
        let (_dir, config) = load(TOML);
        assert_eq!(
            config.require_executable().unwrap(),
            Path::new("/usr/local/bin/resticprofile")
        );

        let (_dir, config) = load("[profiles.home.backup]\nschedule = \"daily\"\n");
        let err = config.require_executable().unwrap_err();
        assert!(matches!(err, ConfigError::MissingExecutable { .. }));
        assert!(err.to_string().contains("global.executable"));
    }

    #[test]
    fn schedule_accepts_string_or_list() {
        let (_dir, config) = load(TOML);
        let home = config.profile("home").unwrap();
        assert_eq!(home.backup.as_ref().unwrap().schedule.len(), 2);
        assert_eq!(home.check.as_ref().unwrap().schedule, ["weekly"]);
    }

    #[test]
    fn scheduled_jobs_skip_unscheduled_commands() {
        let (_dir, config) = load(TOML);
        let jobs = config.profile("home").unwrap().scheduled_jobs(
            "home",
            Path::new("/bin/rp"),
            Path::new("/etc/profiles.toml"),
        );
        let names: Vec<String> = jobs.iter().map(JobConfig::name).collect();
        assert_eq!(names, ["backup@home", "check@home"]);
        assert_eq!(jobs[0].permission, Permission::UserBackground);
        assert!(jobs[0].has_flag(FLAG_NO_START));
        assert_eq!(jobs[1].permission, Permission::Auto);
    }

    #[test]
    fn removable_jobs_cover_every_command() {
        let (_dir, config) = load(TOML);
        let jobs = config.profile("home").unwrap().removable_jobs(
            "home",
            Path::new("/bin/rp"),
            Path::new("/etc/profiles.toml"),
        );
        let names: Vec<String> = jobs.iter().map(JobConfig::name).collect();
        assert_eq!(
            names,
            ["backup@home", "check@home", "forget@home", "prune@home", "copy@home"]
        );
        assert!(!jobs[0].is_remove_only());
        assert!(jobs[2].is_remove_only());
        assert!(jobs[3].is_remove_only());
        assert_eq!(jobs[3].permission, Permission::System);
    }

    #[test]
    fn empty_profile_has_no_scheduled_jobs() {
        let (_dir, config) = load(TOML);
        let root = config.profile("root").unwrap();
        assert!(
            root.scheduled_jobs("root", Path::new("/bin/rp"), Path::new("/c.toml"))
                .is_empty()
        );
    }

    #[test]
    fn unknown_profile_lists_available_ones() {
        let (_dir, config) = load(TOML);
        let err = config.require_profile("work").unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'work' not found (available: home, root)"
        );
    }

    #[test]
    fn load_yaml_matches_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "profiles.yaml",
            "profiles:\n  home:\n    backup:\n      schedule: daily\n      schedule-permission: user_logged_on\n",
        );
        let config = Config::load(&path).unwrap();
        let backup = config.profile("home").unwrap().backup.as_ref().unwrap();
        assert_eq!(backup.schedule, ["daily"]);
        assert_eq!(backup.permission(), Permission::UserLoggedOn);
        assert!(config.global.scheduler.is_none());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "profiles.conf", "[global]\n");
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn unknown_permission_token_means_auto() {
        let settings = CommandSchedule {
            schedule_permission: Some("whoever".to_string()),
            ..CommandSchedule::default()
        };
        assert_eq!(settings.permission(), Permission::Auto);
    }
}
