//! Command line grammar.
//!
//! This module turns input into [`Command`] values:
//! - [`tokenize`] splits an interactive line, honoring quotes and `\"`
//! - [`encode`] re-serializes arguments into a line `tokenize` accepts
//! - [`Verb`] names the operations the shell dispatches
//!
//! # Example
//!
//! ```
//! use zk_shell::command::{Command, Verb};
//!
//! let cmd = Command::parse(r#"create /app "hello world""#);
//! assert_eq!(cmd.verb, "create");
//! assert_eq!(cmd.args, vec!["/app", "hello world"]);
//! assert_eq!(cmd.verb.parse::<Verb>().unwrap(), Verb::Create);
//! ```

mod parser;
mod verb;

pub use parser::{encode, tokenize};
pub use verb::{Verb, EXIT, USAGE};

/// A verb plus its positional arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// First token of the line.
    pub verb: String,
    /// Remaining tokens, in order.
    pub args: Vec<String>,
}

impl Command {
    /// Create a command from already split parts.
    pub fn new(verb: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }

    /// Parse an interactive input line with the full quoting grammar.
    pub fn parse(line: &str) -> Self {
        let (verb, args) = tokenize(line);
        Self { verb, args }
    }

    /// Build a command from pre-split process arguments (batch mode).
    ///
    /// No quoting grammar is applied: the first value is the verb and
    /// the rest are taken verbatim.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = args.into_iter().map(Into::into);
        let verb = iter.next().unwrap_or_default();
        Self {
            verb,
            args: iter.collect(),
        }
    }

    /// Positional argument at `idx`, if present.
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }

    /// Positional argument at `idx`, or `default` when missing.
    pub fn arg_or<'a>(&'a self, idx: usize, default: &'a str) -> &'a str {
        self.arg(idx).unwrap_or(default)
    }

    /// Check whether this is the shell-only `exit` verb.
    pub fn is_exit(&self) -> bool {
        self.verb == EXIT
    }
}
