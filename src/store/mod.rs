//! Capability surface of the hierarchical store.
//!
//! The shell never talks to a wire protocol directly. It establishes
//! handles through a [`Connector`] and issues requests through the
//! [`StoreClient`] each handle implements. [`MemoryEnsemble`] provides an
//! in-process tree with the same semantics.

mod memory;

pub use memory::MemoryEnsemble;

use std::fmt;

use crate::error::StoreError;
use crate::session::{ConnectionState, SessionId};

/// Default ensemble address.
pub const DEFAULT_SERVER: &str = "127.0.0.1:2181";

/// Permission bits granted by an ACL entry.
pub mod perms {
    pub const READ: u32 = 1;
    pub const WRITE: u32 = 1 << 1;
    pub const CREATE: u32 = 1 << 2;
    pub const DELETE: u32 = 1 << 3;
    pub const ADMIN: u32 = 1 << 4;
    pub const ALL: u32 = READ | WRITE | CREATE | DELETE | ADMIN;
}

/// One access control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    /// Permission bits, see [`perms`].
    pub perms: u32,
    /// Authentication scheme the entry applies to.
    pub scheme: String,
    /// Identity within the scheme.
    pub id: String,
}

impl Acl {
    /// Entry granting every permission to everyone.
    pub fn world_all() -> Self {
        Self {
            perms: perms::ALL,
            scheme: "world".to_string(),
            id: "anyone".to_string(),
        }
    }
}

/// Node metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stat {
    /// Transaction that created the node.
    pub czxid: i64,
    /// Transaction that last modified the node's data.
    pub mzxid: i64,
    /// Creation time, milliseconds since the epoch.
    pub ctime: i64,
    /// Last modification time, milliseconds since the epoch.
    pub mtime: i64,
    /// Number of data changes.
    pub version: i32,
    /// Number of child list changes.
    pub cversion: i32,
    /// Number of ACL changes.
    pub aversion: i32,
    /// Owning session for ephemeral nodes, 0 otherwise.
    pub ephemeral_owner: i64,
    /// Length of the node's data.
    pub data_length: i32,
    /// Number of children.
    pub num_children: i32,
    /// Transaction that last modified the child list.
    pub pzxid: i64,
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cZxid = {:#x}", self.czxid)?;
        writeln!(f, "ctime = {}", self.ctime)?;
        writeln!(f, "mZxid = {:#x}", self.mzxid)?;
        writeln!(f, "mtime = {}", self.mtime)?;
        writeln!(f, "pZxid = {:#x}", self.pzxid)?;
        writeln!(f, "cversion = {}", self.cversion)?;
        writeln!(f, "dataVersion = {}", self.version)?;
        writeln!(f, "aclVersion = {}", self.aversion)?;
        writeln!(f, "ephemeralOwner = {:#x}", self.ephemeral_owner)?;
        writeln!(f, "dataLength = {}", self.data_length)?;
        write!(f, "numChildren = {}", self.num_children)
    }
}

/// A credential attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    /// Scheme name, e.g. `digest`.
    pub scheme: String,
    /// Scheme-specific secret.
    pub secret: String,
}

impl Auth {
    /// Create a credential.
    pub fn new(scheme: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            secret: secret.into(),
        }
    }

    /// `digest` credential for a user and password.
    pub fn digest(user: &str, password: &str) -> Self {
        Self::new("digest", format!("{user}:{password}"))
    }
}

/// Settings used to establish a session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    servers: Vec<String>,
    auth: Option<Auth>,
    verbose: bool,
}

impl ClientConfig {
    /// Create a configuration for the given servers.
    pub fn new(servers: Vec<String>, verbose: bool) -> Self {
        Self {
            servers,
            auth: None,
            verbose,
        }
    }

    /// Build a one-shot configuration from a comma separated server list.
    pub fn from_server_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::to_string).collect(), false)
    }

    /// Attach a credential applied right after establishment.
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Ensemble addresses, in order.
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Credential to apply, if any.
    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Whether client-level logging was requested.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(vec![DEFAULT_SERVER.to_string()], false)
    }
}

/// Requests a session handle serves.
///
/// Version arguments of `None` skip the version check.
pub trait StoreClient {
    /// Server-assigned session id.
    fn session_id(&self) -> SessionId;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Names of the immediate children of `path`.
    fn list_children(&mut self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Value and metadata of `path`.
    fn get(&mut self, path: &str) -> Result<(Vec<u8>, Stat), StoreError>;

    /// Create a persistent node, returning its path.
    fn create(&mut self, path: &str, data: &[u8], acl: &[Acl]) -> Result<String, StoreError>;

    /// Overwrite the value of `path`.
    fn set(&mut self, path: &str, data: &[u8], version: Option<i32>) -> Result<Stat, StoreError>;

    /// Delete a node without children.
    fn delete(&mut self, path: &str, version: Option<i32>) -> Result<(), StoreError>;

    /// Attach a credential to the session.
    fn add_auth(&mut self, scheme: &str, secret: &[u8]) -> Result<(), StoreError>;

    /// Release the connection.
    fn close(&mut self);
}

/// Factory for session handles.
pub trait Connector {
    /// Establish a new handle with the given configuration.
    fn establish(&self, config: &ClientConfig) -> Result<Box<dyn StoreClient>, StoreError>;
}
