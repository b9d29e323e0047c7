use std::fmt;

use super::{CommandSchedule, Config, GlobalSection, ProfileSchedules, SCHEDULABLE_COMMANDS};
use crate::schedule::{Permission, SchedulerKind};

/// A validation warning detected after loading a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration section (e.g., "global", "profiles.home.backup").
    pub source: String,
    /// The specific key that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning about `item` reported by `source`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.source, self.item, self.message)
    }
}

/// Trait for configuration validators.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator (e.g., "global").
    fn name(&self) -> &'static str;
}

/// Validator for the `[global]` section.
#[derive(Debug)]
pub struct GlobalValidator<'a> {
    global: &'a GlobalSection,
}

impl<'a> GlobalValidator<'a> {
    /// Create a validator for the `[global]` section.
    #[must_use]
    pub const fn new(global: &'a GlobalSection) -> Self {
        Self { global }
    }
}

impl ConfigValidator for GlobalValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(name) = &self.global.scheduler
            && let Err(e) = SchedulerKind::from_name(name)
        {
            warnings.push(ValidationWarning::new("global", "scheduler", e.to_string()));
        }

        if let Some(executable) = &self.global.executable
            && !executable.is_absolute()
        {
            warnings.push(ValidationWarning::new(
                "global",
                "executable",
                format!(
                    "executable should be an absolute path: {}",
                    executable.display()
                ),
            ));
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "global"
    }
}

/// Validator for the schedules of one profile.
#[derive(Debug)]
pub struct ProfileValidator<'a> {
    name: &'a str,
    profile: &'a ProfileSchedules,
}

impl<'a> ProfileValidator<'a> {
    /// Create a validator for the profile `name`.
    #[must_use]
    pub const fn new(name: &'a str, profile: &'a ProfileSchedules) -> Self {
        Self { name, profile }
    }

    fn validate_command(
        &self,
        command: &str,
        settings: &CommandSchedule,
    ) -> Vec<ValidationWarning> {
        let source = format!("profiles.{}.{command}", self.name);
        let mut warnings = Vec::new();

        if let Some(token) = &settings.schedule_permission
            && !Permission::is_known_token(token)
        {
            warnings.push(ValidationWarning::new(
                &source,
                "schedule-permission",
                format!("unknown permission '{token}', falling back to auto"),
            ));
        }

        if settings.schedule.iter().any(|s| s.trim().is_empty()) {
            warnings.push(ValidationWarning::new(
                &source,
                "schedule",
                "schedule contains a blank expression",
            ));
        }

        if settings.schedule.is_empty() && !settings.schedule_flags.is_empty() {
            warnings.push(ValidationWarning::new(
                &source,
                "schedule-flags",
                "flags have no effect without a schedule",
            ));
        }

        warnings
    }
}

impl ConfigValidator for ProfileValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        SCHEDULABLE_COMMANDS
            .iter()
            .filter_map(|command| {
                self.profile
                    .command(command)
                    .map(|settings| self.validate_command(command, settings))
            })
            .flatten()
            .collect()
    }

    fn name(&self) -> &'static str {
        "profiles"
    }
}

/// Run every validator over `config`.
#[must_use]
pub fn validate(config: &Config) -> Vec<ValidationWarning> {
    let mut validators: Vec<Box<dyn ConfigValidator + '_>> =
        vec![Box::new(GlobalValidator::new(&config.global))];
    for (name, profile) in &config.profiles {
        validators.push(Box::new(ProfileValidator::new(name, profile)));
    }

    validators
        .iter()
        .flat_map(|v| {
            let warnings = v.validate();
            if !warnings.is_empty() {
                tracing::debug!("{} validator: {} warning(s)", v.name(), warnings.len());
            }
            warnings
        })
        .collect()
}
