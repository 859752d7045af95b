//! Realtime presence channel.
//!
//! DESIGN
//! ======
//! [`PresenceTransport`] opens one connection per signed-in user and hands
//! every presence event to the listener it was given. The store owns the
//! returned [`PresenceConnection`] and is the only thing that closes it.

pub mod packet;
pub mod socket;

use std::sync::Arc;

pub use socket::SocketIoTransport;

use crate::error::PresenceError;

/// Inbound event carrying the full list of connected user ids.
pub const ONLINE_USERS_EVENT: &str = "getOnlineUsers";

/// Listener invoked with the id list of each presence event.
pub type OnlineUsersHandler = Arc<dyn Fn(Vec<String>) + Send + Sync>;

#[async_trait::async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Open a channel identified by `user_id` and register `on_online_users`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be established.
    async fn connect(
        &self,
        user_id: &str,
        on_online_users: OnlineUsersHandler,
    ) -> Result<Box<dyn PresenceConnection>, PresenceError>;
}

#[async_trait::async_trait]
pub trait PresenceConnection: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Close the channel. Safe to call on an already-closed connection.
    async fn disconnect(&mut self);
}
