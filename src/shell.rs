//! Command dispatch.
//!
//! [`Shell`] is the context every handler runs against: the standing
//! client configuration, the connector that makes new handles, the active
//! [`Session`] and the [`SuggestionCache`]. One command is fully resolved
//! before the next is accepted.

use std::io::Write;

use tracing::{debug, info};

use crate::cache::SuggestionCache;
use crate::command::{Command, Verb, USAGE};
use crate::error::{ShellError, StoreError};
use crate::path;
use crate::session::{ConnectionState, Session};
use crate::store::{Acl, ClientConfig, Connector, StoreClient};
use crate::Result;

/// Interactive shell context.
pub struct Shell {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    session: Option<Session>,
    cache: SuggestionCache,
}

impl Shell {
    /// Create a shell without a session.
    pub fn new(config: ClientConfig, connector: Box<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            session: None,
            cache: SuggestionCache::new(),
        }
    }

    /// Establish the initial session from the standing configuration.
    pub fn open(&mut self) -> Result<()> {
        let client = self.connector.establish(&self.config)?;
        self.install(client);
        Ok(())
    }

    /// The active session, if one was ever established.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// State of the active session.
    pub fn state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map_or(ConnectionState::Disconnected, Session::state)
    }

    /// Check if the active session can serve requests.
    pub fn is_usable(&self) -> bool {
        self.state().is_usable()
    }

    /// The suggestion cache.
    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    /// Mutable access to the suggestion cache.
    pub fn cache_mut(&mut self) -> &mut SuggestionCache {
        &mut self.cache
    }

    /// Children of `parent` for completion, from the cache when possible.
    ///
    /// Listing failures yield nothing.
    pub fn suggest_children(&mut self, parent: &str) -> Vec<String> {
        if let Some(names) = self.cache.get(parent) {
            return names.to_vec();
        }
        let Ok(client) = usable_client(&mut self.session) else {
            return Vec::new();
        };
        match client.list_children(parent) {
            Ok(names) => {
                self.cache.put(parent, names.clone());
                names
            }
            Err(e) => {
                debug!(parent, error = %e, "completion listing failed");
                Vec::new()
            }
        }
    }

    /// Execute a command, writing its output to `out`.
    ///
    /// Every verb except `connect` is rejected before any store call when
    /// the session is not usable. Returns the first failure encountered.
    /// Output written before a failure (for example by a partially
    /// completed `deleteall`) stays.
    pub fn execute(&mut self, cmd: &Command, out: &mut dyn Write) -> Result<()> {
        let verb: Verb = cmd.verb.parse()?;
        debug!(%verb, args = ?cmd.args, "dispatch");

        if !verb.requires_session() {
            return self.connect(cmd, out);
        }

        let client = usable_client(&mut self.session)?;
        let p = path::normalize(cmd.arg_or(0, path::ROOT));
        match verb {
            Verb::Ls => ls(client, p, out)?,
            Verb::Get => get(client, p, out)?,
            Verb::Create => create(client, p, cmd.arg_or(1, ""), out)?,
            Verb::Set => set(client, p, cmd.arg_or(1, ""), out)?,
            Verb::Delete => delete(client, p, out)?,
            Verb::DeleteAll => delete_recursive(client, &mut self.cache, p, out)?,
            Verb::AddAuth => add_auth(client, cmd, out)?,
            Verb::Close => close(client, out)?,
            Verb::Connect => unreachable!("connect needs no session"),
        }

        if verb.is_structural() {
            invalidate_parent(&mut self.cache, p);
        }
        Ok(())
    }

    /// Execute a command and report failures on `out`.
    ///
    /// Unknown verbs print the usage table, other failures print the error.
    /// Returns the process exit code for the outcome.
    pub fn run(&mut self, cmd: &Command, out: &mut dyn Write) -> i32 {
        match self.execute(cmd, out) {
            Ok(()) => 0,
            Err(e) => {
                debug!(verb = %cmd.verb, error = %e, "command failed");
                let written = match &e {
                    ShellError::UnknownCommand(_) => writeln!(out, "{USAGE}"),
                    _ => writeln!(out, "{e}"),
                };
                if let Err(write_err) = written {
                    debug!(error = %write_err, "failed to report command failure");
                }
                e.exit_code()
            }
        }
    }

    /// Close the active session if it is still usable.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut().filter(|s| s.is_usable()) {
            let _ = session.close();
            info!(session = %session.id(), "session closed on exit");
        }
    }

    fn install(&mut self, client: Box<dyn StoreClient>) {
        let session = Session::new(client);
        info!(session = %session.id(), "connected");
        self.session = Some(session);
    }

    fn connect(&mut self, cmd: &Command, out: &mut dyn Write) -> Result<()> {
        let client = match cmd.arg(0) {
            Some(list) => self
                .connector
                .establish(&ClientConfig::from_server_list(list))?,
            None => self.connector.establish(&self.config)?,
        };

        if let Some(previous) = self.session.as_mut().filter(|s| s.is_usable()) {
            previous.close()?;
            info!(session = %previous.id(), "previous session closed");
        }
        self.install(client);
        debug!(entries = self.cache.len(), "suggestion cache cleared");
        self.cache.clear();
        writeln!(out, "Connected")?;
        Ok(())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn ls(client: &mut dyn StoreClient, p: &str, out: &mut dyn Write) -> Result<()> {
    let children = client.list_children(p)?;
    writeln!(out, "[{}]", children.join(", "))?;
    Ok(())
}

fn get(client: &mut dyn StoreClient, p: &str, out: &mut dyn Write) -> Result<()> {
    let (value, stat) = client.get(p)?;
    writeln!(out, "{}\n{}", String::from_utf8_lossy(&value), stat)?;
    Ok(())
}

fn create(client: &mut dyn StoreClient, p: &str, data: &str, out: &mut dyn Write) -> Result<()> {
    let created = client.create(p, data.as_bytes(), &[Acl::world_all()])?;
    writeln!(out, "Created {created}")?;
    Ok(())
}

fn set(client: &mut dyn StoreClient, p: &str, data: &str, out: &mut dyn Write) -> Result<()> {
    let stat = client.set(p, data.as_bytes(), None)?;
    writeln!(out, "{stat}")?;
    Ok(())
}

fn delete(client: &mut dyn StoreClient, p: &str, out: &mut dyn Write) -> Result<()> {
    client.delete(p, None)?;
    writeln!(out, "Deleted {p}")?;
    Ok(())
}

fn add_auth(client: &mut dyn StoreClient, cmd: &Command, out: &mut dyn Write) -> Result<()> {
    let (Some(scheme), Some(secret)) = (cmd.arg(0), cmd.arg(1)) else {
        return Err(ShellError::Usage("addauth <scheme> <auth>"));
    };
    client.add_auth(scheme, secret.as_bytes())?;
    writeln!(out, "Added")?;
    Ok(())
}

fn close(client: &mut dyn StoreClient, out: &mut dyn Write) -> Result<()> {
    client.close();
    info!(session = %client.session_id(), "closed");
    if !client.state().is_usable() {
        writeln!(out, "Closed")?;
    }
    Ok(())
}

/// Borrow the client of a usable session.
fn usable_client(session: &mut Option<Session>) -> Result<&mut dyn StoreClient> {
    session
        .as_mut()
        .ok_or(ShellError::Connection(ConnectionState::Disconnected))?
        .require_usable()
}

fn invalidate_parent(cache: &mut SuggestionCache, p: &str) {
    if let Some(parent) = path::parent(p) {
        cache.invalidate(parent);
    }
}

/// Delete `p` and everything beneath it, children first.
///
/// Stops at the first failure; nodes deleted before it stay deleted.
fn delete_recursive(
    client: &mut dyn StoreClient,
    cache: &mut SuggestionCache,
    p: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let p = path::normalize(p);
    for child in client.list_children(p).map_err(|e| stopped_at(p, e))? {
        delete_recursive(client, cache, &path::join(p, &child), out)?;
    }
    client.delete(p, None).map_err(|e| stopped_at(p, e))?;
    writeln!(out, "Deleted {p}")?;
    invalidate_parent(cache, p);
    cache.invalidate(p);
    Ok(())
}

fn stopped_at(p: &str, e: StoreError) -> StoreError {
    debug!(path = p, error = %e, "recursive delete stopped");
    e
}
