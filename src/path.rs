//! Tree path helpers.
//!
//! Paths are absolute and slash separated. These helpers never validate:
//! malformed paths are handed to the store, which decides.

/// The root path.
pub const ROOT: &str = "/";

/// Strip trailing slashes, leaving the root untouched.
pub fn normalize(path: &str) -> &str {
    if path == ROOT {
        return path;
    }
    path.trim_end_matches('/')
}

/// Split a path at its last slash into `(parent, leaf)`.
///
/// The parent of a top-level node is the root. Splitting the root itself
/// yields `("/", "")`; callers must not treat that as a real decomposition.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => (ROOT, &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (ROOT, path),
    }
}

/// Parent of a path, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    Some(split(path).0)
}

/// Build the path of `child` under `parent`.
pub fn join(parent: &str, child: &str) -> String {
    if parent == ROOT {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}
