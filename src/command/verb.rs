//! The fixed verb table.

use std::fmt;
use std::str::FromStr;

use crate::error::ShellError;

/// Shell-only verb that ends the interactive loop without dispatch.
pub const EXIT: &str = "exit";

/// Usage table printed for unknown commands.
pub const USAGE: &str = "\
get <path>
ls <path>
create <path> [<data>]
set <path> [<data>]
delete <path>
deleteall <path>
connect <host:port>
addauth <scheme> <auth>
close
exit";

/// Operations the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// List the children of a node.
    Ls,
    /// Read a node's value and metadata.
    Get,
    /// Create a node.
    Create,
    /// Overwrite a node's value.
    Set,
    /// Delete a single node.
    Delete,
    /// Delete a node and its whole subtree.
    DeleteAll,
    /// Replace the session with a new one.
    Connect,
    /// Attach a credential to the session.
    AddAuth,
    /// Release the session.
    Close,
}

impl Verb {
    /// Every dispatchable verb, in usage order.
    pub const ALL: [Verb; 9] = [
        Verb::Get,
        Verb::Ls,
        Verb::Create,
        Verb::Set,
        Verb::Delete,
        Verb::DeleteAll,
        Verb::Connect,
        Verb::AddAuth,
        Verb::Close,
    ];

    /// The name typed at the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Ls => "ls",
            Verb::Get => "get",
            Verb::Create => "create",
            Verb::Set => "set",
            Verb::Delete => "delete",
            Verb::DeleteAll => "deleteall",
            Verb::Connect => "connect",
            Verb::AddAuth => "addauth",
            Verb::Close => "close",
        }
    }

    /// Check whether the verb needs a usable session.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Verb::Connect)
    }

    /// Check whether the verb adds or removes nodes.
    pub fn is_structural(&self) -> bool {
        matches!(self, Verb::Create | Verb::Delete | Verb::DeleteAll)
    }

    /// Check whether the first argument is a node path.
    pub fn takes_path(&self) -> bool {
        !matches!(self, Verb::Connect | Verb::AddAuth | Verb::Close)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ShellError::UnknownCommand(s.to_string()))
    }
}
