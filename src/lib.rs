//! Job lifecycle orchestration for OS schedulers.
//!
//! Installs, removes and reports recurring backup jobs through the native
//! scheduler of the host (systemd timers or the user's crontab), driven by a
//! TOML or YAML profile file.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load profile files and turn command schedules into jobs
//! - **[`schedule`]**: the permission model, the [`schedule::Handler`] contract,
//!   its backends, and the `schedule`/`remove`/`status` lifecycle
//! - **[`exec`]**: process execution behind a mockable trait
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

/// Command-line interface definitions.
pub mod cli;
/// Subcommand implementations.
pub mod commands;
pub mod config;
pub mod envscanner;
pub mod error;
pub mod exec;
pub mod logging;
/// Host detection.
pub mod platform;
pub mod priority;
pub mod schedule;

/// Version string embedded at build time.
#[must_use]
pub const fn version() -> &'static str {
    match option_env!("BACKUP_SCHEDULER_VERSION") {
        Some(version) => version,
        None => env!("CARGO_PKG_VERSION"),
    }
}
