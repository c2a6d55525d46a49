//! # zk-shell
//!
//! Interactive shell for hierarchical key-value stores (ZooKeeper-style
//! trees of named nodes).
//!
//! The crate is the command engine of the shell: a quote-aware tokenizer,
//! a fixed verb table dispatched against a [`Shell`] context, recursive
//! subtree deletion, path normalization, and the connection state machine
//! that gates every operation. The store itself is reached through the
//! [`StoreClient`] and [`Connector`] traits; [`MemoryEnsemble`] implements
//! them in-process.
//!
//! ## Quick Start
//!
//! ```
//! use zk_shell::{ClientConfig, Command, MemoryEnsemble, Shell};
//!
//! fn main() -> zk_shell::Result<()> {
//!     let mut shell = Shell::new(ClientConfig::default(), Box::new(MemoryEnsemble::new()));
//!     shell.open()?;
//!
//!     let mut out = Vec::new();
//!     shell.execute(&Command::parse(r#"create /app "hello world""#), &mut out)?;
//!     shell.execute(&Command::parse("ls /"), &mut out)?;
//!
//!     assert_eq!(String::from_utf8_lossy(&out), "Created /app\n[app]\n");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod path;
pub mod repl;
pub mod session;
pub mod shell;
pub mod store;

// Re-export commonly used types
pub use cache::SuggestionCache;
pub use command::{encode, tokenize, Command, Verb};
pub use error::{Result, ShellError, StoreError};
pub use session::{ConnectionState, Session, SessionId};
pub use shell::Shell;
pub use store::{Acl, Auth, ClientConfig, Connector, MemoryEnsemble, Stat, StoreClient};
