//! Command: print shell completions.
use clap::CommandFactory as _;
use std::io::Write;

use crate::cli::{Cli, CompletionsOpts};

/// Write the completion script for the requested shell to `out`.
pub fn run(opts: &CompletionsOpts, out: &mut dyn Write) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(opts.shell, &mut command, name, out);
}
