//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI layers call the store's actions and render from [`SessionState`]
//! snapshots delivered through [`SessionStore::subscribe`].
//!
//! DESIGN
//! ======
//! The snapshot lives in a `watch` channel; every mutation is a single
//! `send_modify`, so concurrent actions never interleave inside one update
//! and the last write to `auth_user` wins. The realtime connection is kept
//! apart from the snapshot behind an async mutex that is held across the
//! connect guard and the open, so at most one connection exists.
//!
//! ERROR HANDLING
//! ==============
//! Actions return `()`. REST failures become notices (or, for
//! `check_auth`, a silent sign-out) and transport failures become log lines.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::api::AuthApi;
use crate::notify::Notifier;
use crate::presence::{OnlineUsersHandler, PresenceConnection, PresenceTransport};
use crate::types::{AuthUser, LoginData, ProfileUpdate, SignupData};

/// Observable session snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub auth_user: Option<AuthUser>,
    /// Ids of connected users as of the last presence event.
    pub online_users: Vec<String>,
    pub is_signing_up: bool,
    pub is_logging_in: bool,
    pub is_updating_profile: bool,
    pub is_checking_auth: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth_user: None,
            online_users: Vec::new(),
            is_signing_up: false,
            is_logging_in: false,
            is_updating_profile: false,
            is_checking_auth: true,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth_user.is_some()
    }

    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        self.online_users.iter().any(|id| id == user_id)
    }
}

type FlagField = fn(&mut SessionState) -> &mut bool;

/// Raises a pending flag for its lifetime; the flag drops back to `false`
/// on success, failure, and cancellation alike.
struct PendingFlag<'a> {
    state: &'a watch::Sender<SessionState>,
    field: FlagField,
}

impl<'a> PendingFlag<'a> {
    fn raise(state: &'a watch::Sender<SessionState>, field: FlagField) -> Self {
        state.send_modify(|s| *field(s) = true);
        Self { state, field }
    }
}

impl Drop for PendingFlag<'_> {
    fn drop(&mut self) {
        let field = self.field;
        self.state.send_modify(|s| *field(s) = false);
    }
}

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    transport: Arc<dyn PresenceTransport>,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<SessionState>>,
    connection: Mutex<Option<Box<dyn PresenceConnection>>>,
}

impl SessionStore {
    /// Create a signed-out store with `is_checking_auth` raised.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, transport: Arc<dyn PresenceTransport>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { api, transport, notifier, state: Arc::new(state), connection: Mutex::new(None) }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Whether the held realtime connection reports itself connected.
    pub async fn is_socket_connected(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(|conn| conn.is_connected())
    }

    // =========================================================================
    // AUTH ACTIONS
    // =========================================================================

    /// Validate the current session. Any failure counts as signed out and is
    /// not surfaced to the user.
    pub async fn check_auth(&self) {
        let _pending = PendingFlag::raise(&self.state, |s| &mut s.is_checking_auth);
        match self.api.check().await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session valid");
                self.set_user(Some(user));
                self.connect_socket().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "auth check failed");
                self.set_user(None);
                self.disconnect_socket().await;
            }
        }
    }

    pub async fn signup(&self, data: &SignupData) {
        let _pending = PendingFlag::raise(&self.state, |s| &mut s.is_signing_up);
        match self.api.signup(data).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account created");
                self.set_user(Some(user));
                self.notifier.success("Account created successfully");
                self.connect_socket().await;
            }
            Err(e) => {
                tracing::debug!(error = %e, status = ?e.status(), "signup failed");
                self.notifier.error(&e.user_message());
            }
        }
    }

    pub async fn login(&self, data: &LoginData) {
        let _pending = PendingFlag::raise(&self.state, |s| &mut s.is_logging_in);
        match self.api.login(data).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "logged in");
                self.set_user(Some(user));
                self.notifier.success("Logged in successfully");
                self.connect_socket().await;
            }
            Err(e) => {
                tracing::debug!(error = %e, status = ?e.status(), "login failed");
                self.notifier.error(&e.user_message());
            }
        }
    }

    /// End the server session. On failure the local user and the realtime
    /// connection are left as they were.
    pub async fn logout(&self) {
        match self.api.logout().await {
            Ok(()) => {
                self.set_user(None);
                self.notifier.success("Logged out successfully");
                self.disconnect_socket().await;
            }
            Err(e) => {
                tracing::debug!(error = %e, status = ?e.status(), "logout failed");
                self.notifier.error(&e.user_message());
            }
        }
    }

    pub async fn update_profile(&self, data: &ProfileUpdate) {
        let _pending = PendingFlag::raise(&self.state, |s| &mut s.is_updating_profile);
        match self.api.update_profile(data).await {
            Ok(user) => {
                self.set_user(Some(user));
                self.notifier.success("Profile updated successfully");
            }
            Err(e) => {
                tracing::error!(error = %e, status = ?e.status(), "profile update failed");
                self.notifier.error(&e.user_message());
            }
        }
    }

    // =========================================================================
    // REALTIME
    // =========================================================================

    /// Open the presence channel for the signed-in user.
    ///
    /// No-op without a user or while the held connection is live. The lock
    /// is held from the check through the open.
    pub async fn connect_socket(&self) {
        let mut connection = self.connection.lock().await;

        let Some(user_id) = self.state.borrow().auth_user.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        if connection.as_ref().is_some_and(|conn| conn.is_connected()) {
            return;
        }

        let state = Arc::clone(&self.state);
        let on_online_users: OnlineUsersHandler = Arc::new(move |ids: Vec<String>| {
            state.send_modify(|s| s.online_users = ids);
        });

        match self.transport.connect(&user_id, on_online_users).await {
            Ok(conn) => *connection = Some(conn),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "presence connect failed");
                *connection = None;
            }
        }
    }

    /// Close the presence channel if it is live. Never fails.
    pub async fn disconnect_socket(&self) {
        let mut connection = self.connection.lock().await;
        if let Some(mut conn) = connection.take() {
            if conn.is_connected() {
                conn.disconnect().await;
            }
        }
    }

    fn set_user(&self, user: Option<AuthUser>) {
        self.state.send_modify(|s| s.auth_user = user);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
