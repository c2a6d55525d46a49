//! Error types for zk-shell.

use thiserror::Error;

use crate::session::ConnectionState;

/// Failures surfaced by a store client.
///
/// Path-bearing variants carry the path the store rejected, so a failed
/// recursive delete points at the node that could not be removed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The node does not exist.
    #[error("node does not exist: {0}")]
    NoNode(String),

    /// A node already exists at the path.
    #[error("node already exists: {0}")]
    NodeExists(String),

    /// The node still has children.
    #[error("node has children: {0}")]
    NotEmpty(String),

    /// The expected version did not match.
    #[error("version conflict: {0}")]
    BadVersion(String),

    /// The path is not a well-formed absolute path.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// The store rejected the arguments (protected node, bad id).
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// A server address could not be used.
    #[error("invalid server address: {0:?}")]
    InvalidServer(String),

    /// The credential was rejected.
    #[error("authentication failed for scheme {0:?}")]
    AuthFailed(String),

    /// The connection to the ensemble was lost.
    #[error("connection loss")]
    ConnectionLoss,

    /// The session expired on the server side.
    #[error("session expired")]
    SessionExpired,
}

/// Main error type for shell operations.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Verb not in the command table.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Known verb, malformed arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// The session is not usable.
    #[error("connection is disconnected (state: {0})")]
    Connection(ConnectionState),

    /// Failure reported by the store client.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// I/O error while writing command output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The line editor failed.
    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl ShellError {
    /// Process exit code used by batch mode.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::UnknownCommand(_) => 2,
            _ => 3,
        }
    }
}

/// Convenience Result type for shell operations.
pub type Result<T> = std::result::Result<T, ShellError>;
