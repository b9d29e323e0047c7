//! Argument vector passed to the executable a scheduler entry invokes.
use std::fmt;
use std::path::Path;

/// Command-line arguments for a scheduled invocation.
///
/// Keeps the raw vector for backends that pass arguments separately and renders
/// a single quoted string for backends that need one command line.
///
/// # Examples
///
/// ```
/// use backup_scheduler::schedule::CommandArguments;
///
/// let args = CommandArguments::new(["--config", "my config.toml"]);
/// assert_eq!(args.to_string(), r#"--config "my config.toml""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandArguments {
    args: Vec<String>,
}

impl CommandArguments {
    /// Create arguments from anything yielding strings.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The arguments exactly as they will be passed to the executable.
    #[must_use]
    pub fn raw_args(&self) -> &[String] {
        &self.args
    }

    /// Render `executable` followed by the arguments as one quoted command line.
    #[must_use]
    pub fn command_line(&self, executable: &Path) -> String {
        let executable = quote(&executable.to_string_lossy());
        if self.args.is_empty() {
            executable
        } else {
            format!("{executable} {self}")
        }
    }
}

impl fmt::Display for CommandArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arg in &self.args {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(&quote(arg))?;
        }
        Ok(())
    }
}

/// Wrap `arg` in double quotes when it is empty or contains whitespace or quotes.
fn quote(arg: &str) -> String {
    let needs_quotes = arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"');
    if !needs_quotes {
        return arg.to_string();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
