use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the backup scheduler.
#[derive(Parser, Debug)]
#[command(
    name = "backup-scheduler",
    about = "Install, remove and inspect recurring backup jobs in the OS scheduler",
    version = crate::version()
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Configuration file (.toml, .yaml or .yml)
    #[arg(short, long, global = true, default_value = "profiles.toml")]
    pub config: PathBuf,

    /// Profile whose jobs are managed
    #[arg(short, long, global = true, default_value = "default")]
    pub name: String,

    /// Scheduler backend (auto, systemd, crontab); overrides the config file
    #[arg(long, global = true)]
    pub scheduler: Option<String>,

    /// Disable colours and other escape sequences in the output
    #[arg(long, global = true)]
    pub no_ansi: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install the scheduled jobs of the profile
    Schedule,
    /// Remove the scheduled jobs of the profile
    Unschedule,
    /// Show the scheduled jobs of the profile
    Status,
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file of this command.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Unschedule => "unschedule",
            Self::Status => "status",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
