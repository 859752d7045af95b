//! # chat-session
//!
//! Client-side authentication and presence session manager for the chat
//! frontend. A [`SessionStore`] holds the signed-in user, the loading flags
//! that drive UI indicators, and the single realtime connection that feeds
//! the "online users" list.
//!
//! The store is wired from three injected collaborators: an [`AuthApi`] for
//! REST calls, a [`Notifier`] for user-facing notices, and a
//! [`PresenceTransport`] for the realtime channel.

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod presence;
pub mod store;
pub mod types;

pub use api::{AuthApi, HttpAuthApi};
pub use config::SessionConfig;
pub use error::{ApiError, ConfigError, PresenceError};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use presence::{PresenceConnection, PresenceTransport, SocketIoTransport};
pub use store::{SessionState, SessionStore};
pub use types::{AuthUser, LoginData, ProfileUpdate, SignupData};
