//! `reqwest`-backed [`AuthApi`].
//!
//! The backend keeps the session in an HTTP-only cookie, so the client owns a
//! cookie jar: login/signup responses set it, later calls send it back.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::AuthApi;
use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::types::{AuthUser, ErrorBody, LoginData, ProfileUpdate, SignupData};

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client for `config.api_base_url`.
    ///
    /// When `session_token` is given it is stored as the `config.session_cookie`
    /// cookie so the first request is already authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(config: &SessionConfig, session_token: Option<&str>) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_owned();
        let jar = Arc::new(Jar::default());
        if let Some(token) = session_token {
            let url = Url::parse(&base_url).map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
            jar.add_cookie_str(&format!("{}={token}; Path=/", config.session_cookie), &url);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<B: Serialize + Sync>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response, ApiError> {
        let request = self.http.request(method.clone(), self.url(path));
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "auth request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        tracing::debug!(%method, path, status = status.as_u16(), ?message, "auth request rejected");
        Err(ApiError::Rejected { status: status.as_u16(), message })
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn check(&self) -> Result<AuthUser, ApiError> {
        self.send_json::<(), _>(Method::GET, "/auth/check", None)
            .await
    }

    async fn signup(&self, data: &SignupData) -> Result<AuthUser, ApiError> {
        self.send_json(Method::POST, "/auth/signup", Some(data))
            .await
    }

    async fn login(&self, data: &LoginData) -> Result<AuthUser, ApiError> {
        self.send_json(Method::POST, "/auth/login", Some(data))
            .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send::<()>(Method::POST, "/auth/logout", None)
            .await?;
        Ok(())
    }

    async fn update_profile(&self, data: &ProfileUpdate) -> Result<AuthUser, ApiError> {
        self.send_json(Method::PUT, "/auth/update-profile", Some(data))
            .await
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
