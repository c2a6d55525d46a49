//! In-process ensemble with ZooKeeper tree semantics.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use super::{Acl, Auth, ClientConfig, Connector, Stat, StoreClient};
use crate::error::StoreError;
use crate::path;
use crate::session::{ConnectionState, SessionId};

/// Base of the session ids handed out by an ensemble.
const SESSION_ID_BASE: u64 = 0x0100_0000_0000_0000;

#[derive(Debug)]
struct Node {
    data: Vec<u8>,
    acl: Vec<Acl>,
    stat: Stat,
    children: BTreeSet<String>,
}

impl Node {
    fn new(data: Vec<u8>, acl: Vec<Acl>, zxid: i64, now: i64) -> Self {
        let stat = Stat {
            czxid: zxid,
            mzxid: zxid,
            ctime: now,
            mtime: now,
            pzxid: zxid,
            data_length: data.len() as i32,
            ..Stat::default()
        };
        Self {
            data,
            acl,
            stat,
            children: BTreeSet::new(),
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<String, Node>,
    zxid: i64,
    next_session: u64,
    sessions: HashMap<SessionId, ConnectionState>,
    credentials: HashMap<SessionId, Vec<Auth>>,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            path::ROOT.to_string(),
            Node::new(Vec::new(), vec![Acl::world_all()], 0, now_millis()),
        );
        Self {
            nodes,
            zxid: 0,
            next_session: 1,
            sessions: HashMap::new(),
            credentials: HashMap::new(),
        }
    }

    fn next_zxid(&mut self) -> i64 {
        self.zxid += 1;
        self.zxid
    }

    fn node(&self, path: &str) -> Result<&Node, StoreError> {
        validate_path(path)?;
        self.nodes
            .get(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))
    }

    fn create(&mut self, path: &str, data: &[u8], acl: &[Acl]) -> Result<String, StoreError> {
        validate_path(path)?;
        if path == path::ROOT || self.nodes.contains_key(path) {
            return Err(StoreError::NodeExists(path.to_string()));
        }
        let (parent, leaf) = path::split(path);
        if !self.nodes.contains_key(parent) {
            return Err(StoreError::NoNode(path.to_string()));
        }

        let zxid = self.next_zxid();
        let node = Node::new(data.to_vec(), acl.to_vec(), zxid, now_millis());
        self.nodes.insert(path.to_string(), node);

        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.insert(leaf.to_string());
            parent.stat.cversion += 1;
            parent.stat.pzxid = zxid;
            parent.stat.num_children = parent.children.len() as i32;
        }
        Ok(path.to_string())
    }

    fn set(&mut self, path: &str, data: &[u8], version: Option<i32>) -> Result<Stat, StoreError> {
        validate_path(path)?;
        let zxid = self.zxid + 1;
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        if version.is_some_and(|v| v != node.stat.version) {
            return Err(StoreError::BadVersion(path.to_string()));
        }

        node.data = data.to_vec();
        node.stat.version += 1;
        node.stat.mzxid = zxid;
        node.stat.mtime = now_millis();
        node.stat.data_length = node.data.len() as i32;
        let stat = node.stat;
        self.zxid = zxid;
        Ok(stat)
    }

    fn delete(&mut self, path: &str, version: Option<i32>) -> Result<(), StoreError> {
        validate_path(path)?;
        if path == path::ROOT {
            return Err(StoreError::BadArguments(path.to_string()));
        }
        let node = self.node(path)?;
        if version.is_some_and(|v| v != node.stat.version) {
            return Err(StoreError::BadVersion(path.to_string()));
        }
        if !node.children.is_empty() {
            return Err(StoreError::NotEmpty(path.to_string()));
        }

        let zxid = self.next_zxid();
        self.nodes.remove(path);
        let (parent, leaf) = path::split(path);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.remove(leaf);
            parent.stat.cversion += 1;
            parent.stat.pzxid = zxid;
            parent.stat.num_children = parent.children.len() as i32;
        }
        Ok(())
    }
}

/// Check a path the way the server does: absolute, no empty segments,
/// no trailing slash, no relative segments.
fn validate_path(path: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidPath(path.to_string());
    if path == path::ROOT {
        return Ok(());
    }
    let rest = path.strip_prefix('/').ok_or_else(invalid)?;
    if path.contains('\0') {
        return Err(invalid());
    }
    if rest.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(invalid());
    }
    Ok(())
}

fn validate_server(server: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidServer(server.to_string());
    let (host, port) = server.rsplit_once(':').ok_or_else(invalid)?;
    if host.trim().is_empty() {
        return Err(invalid());
    }
    port.parse::<u16>().map_err(|_| invalid())?;
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// An in-process ensemble.
///
/// Clones share the same tree, so a handle established after `close`
/// sees everything earlier handles wrote.
#[derive(Debug, Clone)]
pub struct MemoryEnsemble {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryEnsemble {
    /// Create an ensemble holding only the root node.
    pub fn new() -> Self {
        Self {
            tree: Arc::new(Mutex::new(Tree::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expire every usable session, as a server does after a timeout.
    pub fn expire_sessions(&self) {
        let mut tree = self.lock();
        for (id, state) in tree.sessions.iter_mut() {
            if state.transition_to(ConnectionState::Expired).is_ok() {
                debug!(session = %id, "session expired");
            }
        }
    }

    /// ACL of a node, if it exists.
    pub fn acl(&self, path: &str) -> Option<Vec<Acl>> {
        self.lock().nodes.get(path).map(|node| node.acl.clone())
    }

    /// Credentials attached to a session.
    pub fn credentials(&self, id: SessionId) -> Vec<Auth> {
        self.lock().credentials.get(&id).cloned().unwrap_or_default()
    }

    /// Check whether a node exists.
    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }
}

impl Default for MemoryEnsemble {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryEnsemble {
    fn establish(&self, config: &ClientConfig) -> Result<Box<dyn StoreClient>, StoreError> {
        if config.servers().is_empty() {
            return Err(StoreError::InvalidServer(String::new()));
        }
        for server in config.servers() {
            validate_server(server)?;
        }

        let mut state = ConnectionState::Connecting;
        let id = {
            let mut tree = self.lock();
            let id = SessionId::from_raw(SESSION_ID_BASE + tree.next_session);
            tree.next_session += 1;
            let _ = state.transition_to(ConnectionState::Connected);
            let _ = state.transition_to(ConnectionState::HasSession);
            tree.sessions.insert(id, state);
            id
        };
        debug!(session = %id, servers = ?config.servers(), "session established");

        let mut client = MemoryClient {
            ensemble: self.clone(),
            id,
            verbose: config.verbose(),
        };
        if let Some(auth) = config.auth() {
            if let Err(e) = client.add_auth(&auth.scheme, auth.secret.as_bytes()) {
                client.close();
                return Err(e);
            }
        }
        Ok(Box::new(client))
    }
}

/// Handle onto a [`MemoryEnsemble`].
///
/// A verbose handle logs every request it serves.
#[derive(Debug)]
struct MemoryClient {
    ensemble: MemoryEnsemble,
    id: SessionId,
    verbose: bool,
}

impl MemoryClient {
    fn trace_request(&self, op: &'static str, path: &str) {
        if self.verbose {
            debug!(session = %self.id, op, path, "request");
        }
    }

    /// Lock the tree after checking that this session may issue requests.
    fn usable_tree(&self) -> Result<MutexGuard<'_, Tree>, StoreError> {
        let tree = self.ensemble.lock();
        match tree.sessions.get(&self.id) {
            Some(state) if state.is_usable() => Ok(tree),
            Some(ConnectionState::Expired) => Err(StoreError::SessionExpired),
            _ => Err(StoreError::ConnectionLoss),
        }
    }
}

impl StoreClient for MemoryClient {
    fn session_id(&self) -> SessionId {
        self.id
    }

    fn state(&self) -> ConnectionState {
        self.ensemble
            .lock()
            .sessions
            .get(&self.id)
            .copied()
            .unwrap_or(ConnectionState::Disconnected)
    }

    fn list_children(&mut self, path: &str) -> Result<Vec<String>, StoreError> {
        self.trace_request("ls", path);
        let tree = self.usable_tree()?;
        Ok(tree.node(path)?.children.iter().cloned().collect())
    }

    fn get(&mut self, path: &str) -> Result<(Vec<u8>, Stat), StoreError> {
        self.trace_request("get", path);
        let tree = self.usable_tree()?;
        let node = tree.node(path)?;
        Ok((node.data.clone(), node.stat))
    }

    fn create(&mut self, path: &str, data: &[u8], acl: &[Acl]) -> Result<String, StoreError> {
        self.trace_request("create", path);
        self.usable_tree()?.create(path, data, acl)
    }

    fn set(&mut self, path: &str, data: &[u8], version: Option<i32>) -> Result<Stat, StoreError> {
        self.trace_request("set", path);
        self.usable_tree()?.set(path, data, version)
    }

    fn delete(&mut self, path: &str, version: Option<i32>) -> Result<(), StoreError> {
        self.trace_request("delete", path);
        self.usable_tree()?.delete(path, version)
    }

    fn add_auth(&mut self, scheme: &str, secret: &[u8]) -> Result<(), StoreError> {
        let mut tree = self.usable_tree()?;
        let malformed_digest = scheme == "digest" && !secret.contains(&b':');
        if scheme.is_empty() || malformed_digest {
            return Err(StoreError::AuthFailed(scheme.to_string()));
        }
        let auth = Auth::new(scheme, String::from_utf8_lossy(secret));
        tree.credentials.entry(self.id).or_default().push(auth);
        Ok(())
    }

    fn close(&mut self) {
        let mut tree = self.ensemble.lock();
        if let Some(state) = tree.sessions.get_mut(&self.id) {
            let _ = state.transition_to(ConnectionState::Disconnected);
        }
        debug!(session = %self.id, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(ensemble: &MemoryEnsemble) -> Box<dyn StoreClient> {
        ensemble.establish(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_establish_assigns_distinct_ids() {
        let ensemble = MemoryEnsemble::new();
        let a = client(&ensemble);
        let b = client(&ensemble);
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(a.state(), ConnectionState::HasSession);
    }

    #[test]
    fn test_establish_rejects_bad_servers() {
        let ensemble = MemoryEnsemble::new();
        for list in ["", "localhost", "host:notaport", ":2181", "ok:2181,bad"] {
            let result = ensemble.establish(&ClientConfig::from_server_list(list));
            assert!(
                matches!(result, Err(StoreError::InvalidServer(_))),
                "{list:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_establish_applies_auth() {
        let ensemble = MemoryEnsemble::new();
        let bad = ClientConfig::default().with_auth(Auth::new("digest", "nocolon"));
        assert!(matches!(
            ensemble.establish(&bad),
            Err(StoreError::AuthFailed(_))
        ));

        let good = ClientConfig::default().with_auth(Auth::digest("u", "p"));
        assert!(ensemble.establish(&good).is_ok());
    }

    #[test]
    fn test_create_and_get() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);

        assert_eq!(c.create("/app", b"v1", &[Acl::world_all()]).unwrap(), "/app");
        assert_eq!(ensemble.acl("/app"), Some(vec![Acl::world_all()]));
        let (data, stat) = c.get("/app").unwrap();
        assert_eq!(data, b"v1");
        assert_eq!(stat.version, 0);
        assert_eq!(stat.data_length, 2);
        assert_eq!(stat.czxid, stat.mzxid);
    }

    #[test]
    fn test_create_requires_parent() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        assert_eq!(
            c.create("/a/b", b"", &[]),
            Err(StoreError::NoNode("/a/b".into()))
        );
    }

    #[test]
    fn test_create_existing() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        c.create("/a", b"", &[]).unwrap();
        assert_eq!(
            c.create("/a", b"", &[]),
            Err(StoreError::NodeExists("/a".into()))
        );
        assert_eq!(
            c.create("/", b"", &[]),
            Err(StoreError::NodeExists("/".into()))
        );
    }

    #[test]
    fn test_invalid_paths() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        for p in ["", "a", "/a/", "/a//b", "/a/./b", "/a/.."] {
            assert_eq!(
                c.get(p),
                Err(StoreError::InvalidPath(p.to_string())),
                "{p:?}"
            );
        }
    }

    #[test]
    fn test_children_sorted_and_parent_stat() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        c.create("/p", b"", &[]).unwrap();
        c.create("/p/zeta", b"", &[]).unwrap();
        c.create("/p/alpha", b"", &[]).unwrap();

        assert_eq!(c.list_children("/p").unwrap(), vec!["alpha", "zeta"]);
        let (_, stat) = c.get("/p").unwrap();
        assert_eq!(stat.num_children, 2);
        assert_eq!(stat.cversion, 2);
    }

    #[test]
    fn test_set_bumps_version() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        c.create("/a", b"one", &[]).unwrap();

        let stat = c.set("/a", b"three", None).unwrap();
        assert_eq!(stat.version, 1);
        assert_eq!(stat.data_length, 5);
        assert!(stat.mzxid > stat.czxid);

        assert_eq!(
            c.set("/a", b"x", Some(0)),
            Err(StoreError::BadVersion("/a".into()))
        );
        assert_eq!(c.set("/a", b"x", Some(1)).unwrap().version, 2);
    }

    #[test]
    fn test_set_missing() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        assert_eq!(
            c.set("/nope", b"", None),
            Err(StoreError::NoNode("/nope".into()))
        );
    }

    #[test]
    fn test_delete_rules() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        c.create("/a", b"", &[]).unwrap();
        c.create("/a/b", b"", &[]).unwrap();

        assert_eq!(
            c.delete("/a", None),
            Err(StoreError::NotEmpty("/a".into()))
        );
        assert_eq!(
            c.delete("/", None),
            Err(StoreError::BadArguments("/".into()))
        );
        assert_eq!(
            c.delete("/missing", None),
            Err(StoreError::NoNode("/missing".into()))
        );

        c.delete("/a/b", None).unwrap();
        c.delete("/a", None).unwrap();
        assert!(!ensemble.exists("/a"));
        assert_eq!(ensemble.node_count(), 1);
    }

    #[test]
    fn test_closed_session_rejects_requests() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        c.close();
        assert_eq!(c.state(), ConnectionState::Disconnected);
        assert_eq!(c.list_children("/"), Err(StoreError::ConnectionLoss));
    }

    #[test]
    fn test_expired_session_rejects_requests() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        ensemble.expire_sessions();
        assert_eq!(c.state(), ConnectionState::Expired);
        assert_eq!(c.get("/"), Err(StoreError::SessionExpired));

        // Closing an expired handle keeps it expired.
        c.close();
        assert_eq!(c.state(), ConnectionState::Expired);
    }

    #[test]
    fn test_shared_tree_across_handles() {
        let ensemble = MemoryEnsemble::new();
        let mut first = client(&ensemble);
        first.create("/shared", b"x", &[]).unwrap();
        first.close();

        let mut second = client(&ensemble);
        assert_eq!(second.get("/shared").unwrap().0, b"x");
    }

    #[test]
    fn test_add_auth() {
        let ensemble = MemoryEnsemble::new();
        let mut c = client(&ensemble);
        assert!(c.add_auth("digest", b"user:pw").is_ok());
        assert!(c.add_auth("ip", b"10.0.0.1").is_ok());
        assert_eq!(
            ensemble.credentials(c.session_id()),
            vec![Auth::digest("user", "pw"), Auth::new("ip", "10.0.0.1")]
        );
        assert_eq!(
            c.add_auth("", b"x"),
            Err(StoreError::AuthFailed(String::new()))
        );
        assert_eq!(
            c.add_auth("digest", b"nopw"),
            Err(StoreError::AuthFailed("digest".into()))
        );
    }

    #[test]
    fn test_verbose_client_logs_requests() {
        let ensemble = MemoryEnsemble::new();
        let verbose = ClientConfig::new(vec!["127.0.0.1:2181".into()], true);

        let logs = crate::logging::capture(|| {
            let mut c = ensemble.establish(&verbose).unwrap();
            c.create("/loud", b"", &[]).unwrap();
        });
        assert!(logs.contains("request"), "{logs}");
        assert!(logs.contains("/loud"), "{logs}");
    }

    #[test]
    fn test_quiet_client_skips_request_logs() {
        let ensemble = MemoryEnsemble::new();

        let logs = crate::logging::capture(|| {
            let mut c = client(&ensemble);
            c.create("/quiet", b"", &[]).unwrap();
        });
        assert!(logs.contains("session established"), "{logs}");
        assert!(!logs.contains("/quiet"), "{logs}");
    }
}
