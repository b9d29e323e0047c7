//! crontab backend: jobs are lines of the invoking user's crontab, tagged
//! with a marker comment so they can be found again.
use std::sync::Arc;

use super::error::{HandlerError, HandlerResult};
use super::event::Event;
use super::handler::Handler;
use super::job::JobConfig;
use super::permission::Permission;
use crate::exec::Executor;

const CRONTAB: &str = "crontab";

/// Comment prefix appended to every line this tool owns.
pub const MARKER_PREFIX: &str = "#backup-scheduler:";

const NICKNAMES: [&str; 7] = [
    "hourly", "daily", "weekly", "monthly", "yearly", "annually", "reboot",
];

/// Marker comment identifying the lines of one job.
#[must_use]
pub fn marker(profile: &str, command: &str) -> String {
    format!("{MARKER_PREFIX}{command}@{profile}")
}

/// [`Handler`] editing the current user's crontab through `crontab -l` / `crontab -`.
#[derive(Debug)]
pub struct CrontabHandler {
    executor: Arc<dyn Executor>,
    euid: u32,
    table: Vec<String>,
}

impl CrontabHandler {
    /// Create a handler for the process running as `euid`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, euid: u32) -> Self {
        Self {
            executor,
            euid,
            table: Vec::new(),
        }
    }

    fn load(&self) -> HandlerResult<Vec<String>> {
        let result = self.executor.run_unchecked(CRONTAB, &["-l"])?;
        if result.success {
            return Ok(result.stdout.lines().map(String::from).collect());
        }
        if result.stderr.contains("no crontab for") {
            return Ok(Vec::new());
        }
        Err(HandlerError::ExecutionFailed {
            program: format!("{CRONTAB} -l"),
            exit_code: result.code.unwrap_or(-1),
            stderr: result.stderr.trim().to_string(),
        })
    }

    fn save(&self) -> HandlerResult<()> {
        let mut content = self.table.join("\n");
        content.push('\n');
        self.executor.run_with_input(CRONTAB, &["-"], &content)?;
        Ok(())
    }

    fn job_lines<'a>(&'a self, job: &JobConfig) -> impl Iterator<Item = &'a String> + 'a {
        let marker = marker(&job.profile_name, &job.command_name);
        self.table
            .iter()
            .filter(move |line| line.trim_end().ends_with(&marker))
    }

    fn ensure_supported(permission: Permission) -> HandlerResult<()> {
        if permission == Permission::Auto {
            return Err(HandlerError::UnsupportedPermission {
                permission,
                scheduler: "crontab",
            });
        }
        Ok(())
    }
}

impl Handler for CrontabHandler {
    fn init(&mut self) -> HandlerResult<()> {
        if !self.executor.which(CRONTAB) {
            return Err(HandlerError::Unavailable {
                tool: CRONTAB.to_string(),
                reason: "not found on PATH".to_string(),
            });
        }
        self.table = self.load()?;
        tracing::debug!("loaded crontab with {} lines", self.table.len());
        Ok(())
    }

    fn close(&mut self) {
        self.table.clear();
    }

    fn detect_schedule_permission(&self, requested: Permission) -> (Permission, bool) {
        match requested {
            Permission::System | Permission::UserBackground => (requested, true),
            Permission::UserLoggedOn => (Permission::UserBackground, true),
            Permission::Auto if self.euid == 0 => (Permission::System, true),
            Permission::Auto => (Permission::UserBackground, false),
        }
    }

    fn check_permission(&self, _job: &JobConfig, permission: Permission) -> HandlerResult<bool> {
        Ok(permission != Permission::Auto && permission.is_granted(self.euid))
    }

    fn parse_schedules(&self, schedules: &[String]) -> HandlerResult<Vec<Event>> {
        schedules
            .iter()
            .map(|expression| {
                to_cron(expression)
                    .map(|native| Event::new(expression.as_str(), native))
                    .ok_or_else(|| HandlerError::InvalidSchedule {
                        expression: expression.clone(),
                        reason: "expected a cron nickname or five cron fields".to_string(),
                    })
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
            match to_cron(expression) {
                Some(native) => tracing::info!("schedule {command}@{profile}: {native}"),
                None => tracing::info!("schedule {command}@{profile}: {expression}"),
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
        Self::ensure_supported(permission)?;
        let marker = marker(&job.profile_name, &job.command_name);
        self.table.retain(|line| !line.trim_end().ends_with(&marker));
        let command = escape_percent(&job.command_line());
        self.table.extend(
            events
                .iter()
                .map(|event| format!("{} {command} {marker}", event.native())),
        );
        self.save()
    }

    fn remove_job(&mut self, job: &JobConfig, permission: Permission) -> HandlerResult<()> {
        Self::ensure_supported(permission)?;
        if self.job_lines(job).next().is_none() {
            return Err(HandlerError::NotFound);
        }
        let marker = marker(&job.profile_name, &job.command_name);
        self.table.retain(|line| !line.trim_end().ends_with(&marker));
        self.save()
    }

    fn display_job_status(&self, job: &JobConfig) -> HandlerResult<()> {
        let mut found = false;
        for line in self.job_lines(job) {
            found = true;
            tracing::info!("{line}");
        }
        if !found {
            tracing::warn!("job {} is not installed", job.name());
        }
        Ok(())
    }

    fn display_status(&self, profile: &str) -> HandlerResult<()> {
        let suffix = format!("@{profile}");
        let lines = self.table.iter().filter(|line| {
            line.split_once(MARKER_PREFIX)
                .is_some_and(|(_, name)| name.trim_end().ends_with(&suffix))
        });
        for line in lines {
            tracing::info!("{line}");
        }
        Ok(())
    }
}

/// Translate a configured expression into a cron time specification.
fn to_cron(expression: &str) -> Option<String> {
    let trimmed = expression.trim();
    let nickname = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if NICKNAMES.contains(&nickname) {
        return Some(format!("@{nickname}"));
    }
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let valid = fields.len() == 5
        && fields.iter().all(|field| {
            field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | ',' | '-' | '/'))
        });
    valid.then(|| fields.join(" "))
}

/// cron treats `%` as a newline in the command field.
fn escape_percent(command: &str) -> String {
    command.replace('%', "\\%")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    const EXISTING: &str = "MAILTO=\"\"\n0 1 * * * /usr/bin/updatedb\n";

    fn job(profile: &str, command: &str) -> JobConfig {
        JobConfig::new(
            profile,
            command,
            "/usr/local/bin/resticprofile",
            "/home/me/profiles.toml",
            vec!["daily".to_string()],
        )
    }

    fn handler(exec: &Arc<MockExecutor>, euid: u32) -> CrontabHandler {
        CrontabHandler::new(exec.clone(), euid)
    }

    #[test]
    fn init_requires_crontab_binary() {
        let exec = Arc::new(MockExecutor::new().with_which(false));
        let err = handler(&exec, 1000).init().unwrap_err();
        assert!(matches!(err, HandlerError::Unavailable { .. }));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn init_treats_missing_crontab_as_empty() {
        let exec = Arc::new(MockExecutor::new().fail("no crontab for me"));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        assert!(handler.table.is_empty());
    }

    #[test]
    fn init_reports_other_failures() {
        let exec = Arc::new(MockExecutor::new().fail("permission denied"));
        let err = handler(&exec, 1000).init().unwrap_err();
        assert!(matches!(err, HandlerError::ExecutionFailed { .. }));
    }

    #[test]
    fn detect_permission() {
        let exec = Arc::new(MockExecutor::new());
        let user = handler(&exec, 1000);
        assert_eq!(
            user.detect_schedule_permission(Permission::Auto),
            (Permission::UserBackground, false)
        );
        assert_eq!(
            user.detect_schedule_permission(Permission::UserLoggedOn),
            (Permission::UserBackground, true)
        );
        assert_eq!(
            handler(&exec, 0).detect_schedule_permission(Permission::Auto),
            (Permission::System, true)
        );
    }

    #[test]
    fn check_permission_follows_grant_rules() {
        let exec = Arc::new(MockExecutor::new());
        let job = job("home", "backup");
        let user = handler(&exec, 1000);
        assert!(!user.check_permission(&job, Permission::System).unwrap());
        assert!(user.check_permission(&job, Permission::UserBackground).unwrap());
        assert!(!user.check_permission(&job, Permission::Auto).unwrap());
        assert!(handler(&exec, 0).check_permission(&job, Permission::System).unwrap());
    }

    #[test]
    fn parse_nicknames_and_fields() {
        let exec = Arc::new(MockExecutor::new());
        let events = handler(&exec, 1000)
            .parse_schedules(&[
                "daily".to_string(),
                "@weekly".to_string(),
                "*/15  2-4 * * mon,fri".to_string(),
            ])
            .unwrap();
        let natives: Vec<&str> = events.iter().map(Event::native).collect();
        assert_eq!(natives, ["@daily", "@weekly", "*/15 2-4 * * mon,fri"]);
        assert_eq!(events[2].expression(), "*/15  2-4 * * mon,fri");
    }

    #[test]
    fn parse_rejects_calendar_expressions() {
        let exec = Arc::new(MockExecutor::new());
        let handler = handler(&exec, 1000);
        for bad in ["*-*-* 03:00:00", "0 3 * *", "fortnightly", "0 3 * * * *"] {
            let err = handler.parse_schedules(&[bad.to_string()]).unwrap_err();
            assert!(
                matches!(err, HandlerError::InvalidSchedule { ref expression, .. } if expression == bad),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn create_job_appends_marked_lines() {
        let exec = Arc::new(MockExecutor::new().ok(EXISTING));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        let events = [Event::new("daily", "@daily"), Event::new("0 3 * * 0", "0 3 * * 0")];
        handler
            .create_job(&job("home", "backup"), &events, Permission::UserBackground)
            .unwrap();

        let calls = exec.calls();
        assert_eq!(calls[1].line(), "crontab -");
        insta::assert_snapshot!(calls[1].input.clone().unwrap(), @r#"
        MAILTO=""
        0 1 * * * /usr/bin/updatedb
        @daily /usr/local/bin/resticprofile --no-ansi --config /home/me/profiles.toml run-schedule backup@home #backup-scheduler:backup@home
        0 3 * * 0 /usr/local/bin/resticprofile --no-ansi --config /home/me/profiles.toml run-schedule backup@home #backup-scheduler:backup@home
        "#);
    }

    #[test]
    fn create_job_replaces_previous_lines() {
        let existing = "@hourly /old/bin run-schedule backup@home #backup-scheduler:backup@home\n";
        let exec = Arc::new(MockExecutor::new().ok(existing));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        handler
            .create_job(
                &job("home", "backup"),
                &[Event::new("daily", "@daily")],
                Permission::UserBackground,
            )
            .unwrap();
        assert_eq!(handler.table.len(), 1);
        assert!(handler.table[0].starts_with("@daily /usr/local/bin/resticprofile"));
    }

    #[test]
    fn create_job_escapes_percent() {
        let exec = Arc::new(MockExecutor::new());
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        let job = JobConfig::new(
            "home",
            "backup",
            "/opt/bin/tool",
            "/tmp/50%/profiles.toml",
            vec!["daily".to_string()],
        );
        handler
            .create_job(&job, &[Event::new("daily", "@daily")], Permission::UserBackground)
            .unwrap();
        assert!(handler.table[0].contains("/tmp/50\\%/profiles.toml"));
    }

    #[test]
    fn remove_job_drops_only_its_lines() {
        let existing = format!(
            "{EXISTING}@daily tool #backup-scheduler:backup@home\n@daily tool #backup-scheduler:check@home\n"
        );
        let exec = Arc::new(MockExecutor::new().ok(&existing));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        handler
            .remove_job(&job("home", "backup"), Permission::UserBackground)
            .unwrap();
        assert_eq!(
            handler.table,
            [
                "MAILTO=\"\"",
                "0 1 * * * /usr/bin/updatedb",
                "@daily tool #backup-scheduler:check@home",
            ]
        );
        assert_eq!(exec.lines()[1], "crontab -");
    }

    #[test]
    fn remove_missing_job_is_not_found() {
        let exec = Arc::new(MockExecutor::new().ok(EXISTING));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        let err = handler
            .remove_job(&job("home", "backup"), Permission::UserBackground)
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(exec.calls().len(), 1, "nothing should be written back");
    }

    #[test]
    fn markers_do_not_match_similar_profiles() {
        let existing = "@daily tool #backup-scheduler:backup@myhome\n";
        let exec = Arc::new(MockExecutor::new().ok(existing));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        assert_eq!(handler.job_lines(&job("home", "backup")).count(), 0);
        assert_eq!(handler.job_lines(&job("myhome", "backup")).count(), 1);
    }

    #[test]
    fn close_discards_buffer() {
        let exec = Arc::new(MockExecutor::new().ok(EXISTING));
        let mut handler = handler(&exec, 1000);
        handler.init().unwrap();
        handler.close();
        assert!(handler.table.is_empty());
    }
}
