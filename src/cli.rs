//! Command-line interface for zk-shell.
//!
//! Uses lexopt. Flags come first; the first positional value starts the
//! batch command, and everything after it is taken verbatim.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Comma separated `host:port` list.
    pub servers: Option<String>,
    /// User for a `digest` credential.
    pub user: Option<String>,
    /// Password for a `digest` credential.
    pub password: Option<String>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Log filter (error, warn, info, debug, trace, or directives).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Batch command: verb followed by its arguments.
    pub command: Vec<String>,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('s') | Long("servers") => {
                result.servers = Some(parser.value()?.parse()?);
            }
            Short('u') | Long("user") => {
                result.user = Some(parser.value()?.parse()?);
            }
            Short('p') | Long("password") => {
                result.password = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('v') | Long("verbose") => {
                result.verbose = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result.command.push(into_string(val)?);
                for raw in parser.raw_args()? {
                    result.command.push(into_string(raw)?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn into_string(value: OsString) -> Result<String, ArgsError> {
    value
        .into_string()
        .map_err(|v| ArgsError::NotUnicode(v.to_string_lossy().into()))
}

/// Help message shown by `--help`.
pub fn help_text() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"zk-shell {version}
Interactive client for hierarchical key-value stores

The store runs in-process: server addresses are validated but no network
connection is made, and every invocation starts from an empty tree.

USAGE:
    zk-shell [OPTIONS]                      Start the interactive shell
    zk-shell [OPTIONS] <VERB> [PATH] [DATA] Run one command and exit

OPTIONS:
    -s, --servers <LIST>    Comma separated host:port list [default: 127.0.0.1:2181]
    -u, --user <USER>       User for digest authentication
    -p, --password <PASS>   Password for digest authentication
    -c, --config <FILE>     Path to configuration file (JSON)
    -v, --verbose           Enable verbose logging, including store requests
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

VERBS:
    ls, get, create, set, delete, deleteall, connect, addauth, close

ENVIRONMENT VARIABLES:
    ZK_SHELL_SERVERS        Server list (overrides config)
    ZK_SHELL_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT CODES:
    0  success
    1  startup failure (arguments, config, initial connection)
    2  unknown command
    3  command failed

EXAMPLES:
    # Interactive shell against a local ensemble
    zk-shell

    # List the children of /app on a remote ensemble
    zk-shell -s zk1:2181,zk2:2181 ls /app

    # Create a node with data, authenticating first
    zk-shell -u admin -p secret create /app/flag on
"#
    )
}

/// Print help message.
pub fn print_help() {
    print!("{}", help_text());
}

/// Print version.
pub fn print_version() {
    println!("zk-shell {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Positional argument that is not valid Unicode.
    NotUnicode(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::NotUnicode(arg) => write!(f, "argument is not valid unicode: '{}'", arg),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("zk-shell")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.servers.is_none());
        assert!(result.command.is_empty());
        assert!(!result.verbose);
    }

    #[test]
    fn test_servers() {
        let result = parse_args_from(args(&["-s", "a:2181,b:2181"])).unwrap();
        assert_eq!(result.servers.as_deref(), Some("a:2181,b:2181"));

        let result = parse_args_from(args(&["--servers", "c:2181"])).unwrap();
        assert_eq!(result.servers.as_deref(), Some("c:2181"));
    }

    #[test]
    fn test_credentials() {
        let result = parse_args_from(args(&["-u", "alice", "-p", "pw"])).unwrap();
        assert_eq!(result.user.as_deref(), Some("alice"));
        assert_eq!(result.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/zk-shell.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/zk-shell.json")));
    }

    #[test]
    fn test_verbose_and_log_level() {
        let result = parse_args_from(args(&["-v", "-l", "trace"])).unwrap();
        assert!(result.verbose);
        assert_eq!(result.log_level.as_deref(), Some("trace"));
    }

    #[test]
    fn test_help_flag() {
        assert!(parse_args_from(args(&["-h"])).unwrap().help);
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
    }

    #[test]
    fn test_version_flag() {
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
        assert!(parse_args_from(args(&["--version"])).unwrap().version);
    }

    #[test]
    fn test_batch_command() {
        let result = parse_args_from(args(&["-s", "h:1", "create", "/a", "hello world"])).unwrap();
        assert_eq!(result.command, vec!["create", "/a", "hello world"]);
    }

    #[test]
    fn test_batch_command_keeps_dash_values() {
        let result = parse_args_from(args(&["set", "/counter", "-1"])).unwrap();
        assert_eq!(result.command, vec!["set", "/counter", "-1"]);
        assert!(result.log_level.is_none());
    }

    #[test]
    fn test_missing_value() {
        assert!(parse_args_from(args(&["-s"])).is_err());
    }

    #[test]
    fn test_unknown_flag() {
        let err = parse_args_from(args(&["--bogus"])).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_help_describes_backend() {
        let help = help_text();
        assert!(help.contains("in-process"));
        assert!(help.contains("--servers"));
        assert!(help.contains(env!("CARGO_PKG_VERSION")));
    }
}
