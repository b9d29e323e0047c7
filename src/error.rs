//! Domain-specific error types shared outside the scheduler backends.
//!
//! Internal modules return typed errors while command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//! Scheduler and lifecycle errors live in [`crate::schedule::error`].
//!
//! ```text
//! ConfigError    - config file loading, format and profile lookup
//! PlatformError  - scheduler selection on the current OS
//! PriorityError  - process niceness adjustments
//! ```
use thiserror::Error;

/// Errors that arise from configuration loading and profile resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file extension does not name a supported format.
    #[error("unsupported config format for {path}: expected .toml, .yaml or .yml")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: String,
    },

    /// The requested profile is not defined in the config file.
    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile {
        /// Requested profile name.
        name: String,
        /// Comma-separated list of defined profiles.
        available: String,
    },

    /// The file could not be parsed.
    #[error("invalid config file {path}: {message}")]
    Parse {
        /// Path of the file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Scheduling needs `global.executable`: the program the installed jobs run.
    #[error("{path}: global.executable must name the program that runs scheduled jobs")]
    MissingExecutable {
        /// Path of the config file.
        path: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from platform-specific scheduler selection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No scheduler backend exists for the current platform.
    #[error("scheduling is not supported on {platform}")]
    Unsupported {
        /// Name of the platform (e.g., `"windows"`).
        platform: String,
    },

    /// The configured scheduler name is not recognised.
    #[error("unknown scheduler '{0}': expected auto, systemd or crontab")]
    UnknownScheduler(String),
}

/// Errors that arise while lowering the process priority.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PriorityError {
    /// The requested niceness is outside `-20..=19`.
    #[error("nice value {0} is out of range (-20..=19)")]
    OutOfRange(i32),

    /// A new process group could not be created to retry the change.
    #[error("cannot create a new process group for priority {nice}: {reason}")]
    NewGroup {
        /// Requested niceness.
        nice: i32,
        /// OS error description.
        reason: String,
    },

    /// Setting the priority failed.
    #[error("cannot set process priority to {nice}: {reason}")]
    Set {
        /// Requested niceness.
        nice: i32,
        /// OS error description.
        reason: String,
    },
}
