use std::collections::HashMap;

use super::*;
use crate::presence::socket::socket_url;

fn config_from(pairs: &[(&str, &str)]) -> Result<SessionConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    SessionConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_to_local_development_backend() {
    let cfg = config_from(&[]).unwrap();
    assert_eq!(cfg.mode, BuildMode::Development);
    assert_eq!(cfg.api_base_url, "http://localhost:5001/api");
    assert_eq!(cfg.socket_url, "http://localhost:5001");
    assert_eq!(cfg.session_cookie, "jwt");
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
}

#[test]
fn production_requires_origin() {
    let err = config_from(&[("CHAT_MODE", "production")]).unwrap_err();
    assert_eq!(err, ConfigError::MissingOrigin);
}

#[test]
fn production_uses_same_origin_for_socket_and_api() {
    let cfg = config_from(&[("CHAT_MODE", "prod"), ("CHAT_ORIGIN", "https://chat.example.com/")]).unwrap();
    assert_eq!(cfg.mode, BuildMode::Production);
    assert_eq!(cfg.api_base_url, "https://chat.example.com/api");
    assert_eq!(cfg.socket_url, "https://chat.example.com");
}

#[test]
fn explicit_urls_override_origin() {
    let cfg = config_from(&[
        ("CHAT_API_BASE_URL", "http://api.test:8080/v2/"),
        ("CHAT_SOCKET_URL", "http://rt.test:9000"),
        ("CHAT_SESSION_COOKIE", "session"),
        ("CHAT_REQUEST_TIMEOUT_SECS", "5"),
        ("CHAT_CONNECT_TIMEOUT_SECS", "2"),
    ])
    .unwrap();
    assert_eq!(cfg.api_base_url, "http://api.test:8080/v2");
    assert_eq!(cfg.socket_url, "http://rt.test:9000");
    assert_eq!(cfg.session_cookie, "session");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });
}

#[test]
fn unparseable_timeouts_fall_back_to_defaults() {
    let cfg = config_from(&[("CHAT_REQUEST_TIMEOUT_SECS", "soon")]).unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn unknown_mode_errors() {
    let err = config_from(&[("CHAT_MODE", "staging")]).unwrap_err().to_string();
    assert!(err.contains("unknown CHAT_MODE"));
}

#[test]
fn non_http_origin_is_rejected() {
    let err = config_from(&[("CHAT_ORIGIN", "localhost:5001")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { var: "CHAT_ORIGIN", .. }));
}

#[test]
fn socket_url_accepts_websocket_schemes() {
    let cfg = config_from(&[("CHAT_SOCKET_URL", "wss://rt.example.com/")]).unwrap();
    assert_eq!(cfg.socket_url, "wss://rt.example.com");
    assert_eq!(socket_url(&cfg.socket_url, "1").unwrap(), "wss://rt.example.com/socket.io/?EIO=4&transport=websocket&userId=1");
}

#[test]
fn api_url_rejects_websocket_scheme() {
    let err = config_from(&[("CHAT_API_BASE_URL", "ws://localhost:5001/api")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { var: "CHAT_API_BASE_URL", .. }));
}

#[test]
fn for_origin_trims_trailing_slash() {
    let cfg = SessionConfig::for_origin("http://127.0.0.1:4000/");
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:4000/api");
    assert_eq!(cfg.socket_url, "http://127.0.0.1:4000");
}
