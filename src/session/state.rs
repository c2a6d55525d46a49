//! Connection state machine.

use std::fmt;

/// Lifecycle state of a session handle, as reported by the store client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// The handle is being established.
    #[default]
    Connecting,
    /// A server accepted the connection.
    Connected,
    /// The server granted a session.
    HasSession,
    /// The connection was closed or lost.
    Disconnected,
    /// The server expired the session.
    Expired,
}

impl ConnectionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Connecting -> Connected | HasSession | Disconnected
    /// - Connected -> HasSession | Disconnected | Expired
    /// - HasSession -> Disconnected | Expired
    ///
    /// Leaving `Disconnected` or `Expired` takes a new handle.
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (*self, target),
            (Connecting, Connected)
                | (Connecting, HasSession)
                | (Connecting, Disconnected)
                | (Connected, HasSession)
                | (Connected, Disconnected)
                | (Connected, Expired)
                | (HasSession, Disconnected)
                | (HasSession, Expired)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: ConnectionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::ShellError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if the handle can serve requests.
    pub fn is_usable(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::HasSession)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
