//! Session configuration parsed from environment variables.

use crate::error::ConfigError;

pub const DEFAULT_DEV_ORIGIN: &str = "http://localhost:5001";
pub const DEFAULT_API_PATH: &str = "/api";
pub const DEFAULT_SESSION_COOKIE: &str = "jwt";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build mode; selects where the backend lives when no origin is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    /// Applies to the HTTP connect and to the realtime handshake.
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: BuildMode,
    /// Base for the REST calls, e.g. `http://localhost:5001/api`.
    pub api_base_url: String,
    /// Base for the realtime channel, e.g. `http://localhost:5001`.
    pub socket_url: String,
    pub session_cookie: String,
    pub timeouts: Timeouts,
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `CHAT_MODE`: `development` (default) or `production`
    /// - `CHAT_ORIGIN`: backend origin; required in production
    /// - `CHAT_API_BASE_URL`: default `<origin>/api`
    /// - `CHAT_SOCKET_URL`: default `<origin>`; also accepts `ws(s)://`
    /// - `CHAT_SESSION_COOKIE`: default `jwt`
    /// - `CHAT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CHAT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown mode, a missing production origin, or
    /// a URL with an unsupported scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = parse_mode(lookup("CHAT_MODE").as_deref())?;

        let origin = match (lookup("CHAT_ORIGIN"), mode) {
            (Some(origin), _) => validated_url("CHAT_ORIGIN", &origin)?,
            (None, BuildMode::Development) => DEFAULT_DEV_ORIGIN.to_owned(),
            (None, BuildMode::Production) => return Err(ConfigError::MissingOrigin),
        };

        let api_base_url = match lookup("CHAT_API_BASE_URL") {
            Some(url) => validated_url("CHAT_API_BASE_URL", &url)?,
            None => format!("{origin}{DEFAULT_API_PATH}"),
        };
        let socket_url = match lookup("CHAT_SOCKET_URL") {
            Some(url) => validated_url_with("CHAT_SOCKET_URL", &url, SOCKET_SCHEMES)?,
            None => origin,
        };

        let session_cookie = lookup("CHAT_SESSION_COOKIE")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_owned());
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("CHAT_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("CHAT_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { mode, api_base_url, socket_url, session_cookie, timeouts })
    }

    /// Development config pointed at an explicit origin.
    #[must_use]
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            mode: BuildMode::Development,
            api_base_url: format!("{origin}{DEFAULT_API_PATH}"),
            socket_url: origin.to_owned(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_mode(raw: Option<&str>) -> Result<BuildMode, ConfigError> {
    match raw.map(str::trim).unwrap_or("development") {
        "development" | "dev" => Ok(BuildMode::Development),
        "production" | "prod" => Ok(BuildMode::Production),
        other => Err(ConfigError::Parse(format!("unknown CHAT_MODE: {other}"))),
    }
}

const HTTP_SCHEMES: &[&str] = &["http://", "https://"];
const SOCKET_SCHEMES: &[&str] = &["http://", "https://", "ws://", "wss://"];

fn validated_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    validated_url_with(var, raw, HTTP_SCHEMES)
}

fn validated_url_with(var: &'static str, raw: &str, schemes: &[&str]) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if schemes.iter().any(|scheme| trimmed.starts_with(scheme)) {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidUrl { var, value: raw.to_owned() })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
