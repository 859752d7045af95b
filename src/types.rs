//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! `AuthUser` names the fields the session layer reads and keeps every other
//! field in `extra`, so a stored user serializes back to the payload the
//! server sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user's profile as returned by the auth endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Server-side user identifier; also the presence `userId`.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Avatar URL or data URI.
    #[serde(rename = "profilePic", default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Any field not named above, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthUser {
    /// Name to show in UI and logs, falling back to email, then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Registration form submitted to `POST /auth/signup`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupData {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Credentials submitted to `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Profile changes submitted to `PUT /auth/update-profile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "profilePic")]
    pub profile_pic: String,
}

/// Error body shape used by the backend: `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
