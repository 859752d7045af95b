//! REST seam for the auth endpoints.
//!
//! DESIGN
//! ======
//! `SessionStore` only sees the [`AuthApi`] trait, so tests swap in a mock
//! and the HTTP details stay in [`HttpAuthApi`].

pub mod http;

pub use http::HttpAuthApi;

use crate::error::ApiError;
use crate::types::{AuthUser, LoginData, ProfileUpdate, SignupData};

#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/check`: the user bound to the current session.
    ///
    /// # Errors
    ///
    /// Any failure means "not authenticated" to the caller.
    async fn check(&self) -> Result<AuthUser, ApiError>;

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the server refuses the form.
    async fn signup(&self, data: &SignupData) -> Result<AuthUser, ApiError>;

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for bad credentials.
    async fn login(&self, data: &LoginData) -> Result<AuthUser, ApiError>;

    /// `POST /auth/logout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server could not end the session.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `PUT /auth/update-profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the update is refused.
    async fn update_profile(&self, data: &ProfileUpdate) -> Result<AuthUser, ApiError>;
}
