//! Session handle management.
//!
//! A [`Session`] wraps the store client bound to one connection. The shell
//! owns at most one; `connect` replaces it wholesale and `close` releases
//! it. Every operation except `connect` goes through
//! [`Session::require_usable`].

mod id;
mod state;

pub use id::SessionId;
pub use state::ConnectionState;

use crate::error::ShellError;
use crate::store::StoreClient;
use crate::Result;

/// The live capability bound to one connection.
pub struct Session {
    client: Box<dyn StoreClient>,
}

impl Session {
    /// Wrap an established client.
    pub fn new(client: Box<dyn StoreClient>) -> Self {
        Self { client }
    }

    /// Server-assigned session id.
    pub fn id(&self) -> SessionId {
        self.client.session_id()
    }

    /// Current state as reported by the client.
    pub fn state(&self) -> ConnectionState {
        self.client.state()
    }

    /// Check if the session can serve requests.
    pub fn is_usable(&self) -> bool {
        self.state().is_usable()
    }

    /// Borrow the client, failing when the session is not usable.
    pub fn require_usable(&mut self) -> Result<&mut dyn StoreClient> {
        let state = self.state();
        if !state.is_usable() {
            return Err(ShellError::Connection(state));
        }
        Ok(self.client.as_mut())
    }

    /// Release the connection.
    ///
    /// Fails if the session is already unusable.
    pub fn close(&mut self) -> Result<()> {
        self.require_usable()?.close();
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
