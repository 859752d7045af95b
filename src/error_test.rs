use super::*;

#[test]
fn user_message_prefers_server_message() {
    let err = ApiError::Rejected { status: 400, message: Some("Invalid credentials".to_owned()) };
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[test]
fn user_message_falls_back_to_status_without_message() {
    let err = ApiError::Rejected { status: 502, message: None };
    assert_eq!(err.user_message(), "Request failed (502)");
}

#[test]
fn user_message_ignores_blank_server_message() {
    let err = ApiError::Rejected { status: 500, message: Some("  ".to_owned()) };
    assert_eq!(err.user_message(), "Request failed (500)");
}

#[test]
fn user_message_for_transport_error_does_not_leak_details() {
    let err = ApiError::Transport("connection refused (os error 111)".to_owned());
    assert_eq!(err.user_message(), "Unable to reach the server");
}

#[test]
fn status_only_set_for_rejections() {
    assert_eq!(ApiError::Rejected { status: 401, message: None }.status(), Some(401));
    assert_eq!(ApiError::Decode("eof".to_owned()).status(), None);
}

#[test]
fn config_error_messages_name_the_variable() {
    let err = ConfigError::InvalidUrl { var: "CHAT_ORIGIN", value: "ftp://x".to_owned() };
    assert_eq!(err.to_string(), "invalid URL for CHAT_ORIGIN: ftp://x");
}
