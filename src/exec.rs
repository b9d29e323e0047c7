//! Process execution behind a trait so scheduler backends can be tested
//! without touching the real system.
use anyhow::{Context, Result, bail};
use std::io::Write as _;
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs external programs on behalf of scheduler backends.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command feeding `input` on standard input. Fails if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned, its input cannot be
    /// written, or it exits non-zero.
    fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<ExecResult> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .with_context(|| format!("failed to write input to {program}"))?;
        }
        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for {program}"))?;
        check(ExecResult::from(output), program)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn check(result: ExecResult, label: &str) -> Result<ExecResult> {
    if !result.success {
        bail!(
            "{label} failed (exit {}): {}",
            result.code.unwrap_or(-1),
            result.stderr.trim()
        );
    }
    Ok(result)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn run_unchecked_echo() {
        let result = SystemExecutor.run_unchecked("echo", &["hello"]).unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_with_input_failure() {
        let result = SystemExecutor.run_with_input("false", &[], "");
        assert!(result.is_err(), "non-zero exit should produce an error");
    }

    #[cfg(unix)]
    #[test]
    fn run_unchecked_failure() {
        let result = SystemExecutor.run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[cfg(unix)]
    #[test]
    fn run_with_input_feeds_stdin() {
        let result = SystemExecutor
            .run_with_input("cat", &[], "line one\nline two\n")
            .unwrap();
        assert_eq!(result.stdout, "line one\nline two\n");
    }

    #[test]
    fn missing_program_is_an_error() {
        let result = SystemExecutor.run_unchecked("this-program-does-not-exist-12345", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn which_missing_program() {
        assert!(
            !SystemExecutor.which("this-program-does-not-exist-12345"),
            "non-existent program should not be found"
        );
    }

    #[test]
    fn mock_executor_records_calls_and_replays_responses() {
        let exec = test_helpers::MockExecutor::new().ok("first").fail("nope");
        let first = exec
            .run_unchecked("systemctl", &["--user", "daemon-reload"])
            .unwrap();
        assert_eq!(first.stdout, "first");
        assert!(exec.run_with_input("crontab", &["-"], "x\n").is_err());
        assert!(exec.run_unchecked("systemctl", &["status"]).unwrap().success);
        assert_eq!(
            exec.lines(),
            [
                "systemctl --user daemon-reload",
                "crontab -",
                "systemctl status"
            ]
        );
    }
}
