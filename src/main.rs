//! `backup-scheduler` binary entry point.
use anyhow::Result;
use clap::Parser;

use backup_scheduler::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let ansi = !args.global.no_ansi && enable_ansi_support::enable_ansi_support().is_ok();

    match &args.command {
        cli::Command::Completions(opts) => {
            commands::completions::run(opts, &mut std::io::stdout());
            return Ok(());
        }
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
        cli::Command::Schedule | cli::Command::Unschedule | cli::Command::Status => {}
    }

    let command = args.command.log_name();
    logging::init_subscriber(args.verbose, ansi, command);
    let log = logging::Logger::new(command);

    match args.command {
        cli::Command::Schedule => commands::schedule::run(&args.global, &log),
        cli::Command::Unschedule => commands::unschedule::run(&args.global, &log),
        cli::Command::Status => commands::status::run(&args.global, &log),
        cli::Command::Completions(_) | cli::Command::Version => Ok(()),
    }
}
