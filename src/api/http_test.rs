use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn api_for(server: &MockServer, session_token: Option<&str>) -> HttpAuthApi {
    let config = SessionConfig::for_origin(&server.uri());
    HttpAuthApi::new(&config, session_token).unwrap()
}

fn login_data() -> LoginData {
    LoginData { email: "a@x.com".to_owned(), password: "p".to_owned() }
}

#[tokio::test]
async fn login_posts_credentials_and_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "a@x.com", "password": "p" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "1",
            "email": "a@x.com",
            "fullName": "Ada",
            "profilePic": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = api_for(&server, None).login(&login_data()).await.unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.full_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid credentials" })))
        .mount(&server)
        .await;

    let err = api_for(&server, None).login(&login_data()).await.unwrap_err();
    assert_eq!(err, ApiError::Rejected { status: 400, message: Some("Invalid credentials".to_owned()) });
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn rejection_without_json_body_has_no_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server, None).check().await.unwrap_err();
    assert_eq!(err, ApiError::Rejected { status: 502, message: None });
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "a@x.com" })))
        .mount(&server)
        .await;

    let err = api_for(&server, None).check().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = SessionConfig::for_origin("http://127.0.0.1:1");
    let api = HttpAuthApi::new(&config, None).unwrap();
    let err = api.check().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn session_token_is_sent_as_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .and(header("cookie", "jwt=tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "7" })))
        .expect(1)
        .mount(&server)
        .await;

    let user = api_for(&server, Some("tok123")).check().await.unwrap();
    assert_eq!(user.id, "7");
}

#[tokio::test]
async fn logout_ignores_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Logged out successfully" })))
        .expect(1)
        .mount(&server)
        .await;

    api_for(&server, None).logout().await.unwrap();
}

#[tokio::test]
async fn update_profile_uses_put() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/update-profile"))
        .and(body_json(json!({ "profilePic": "https://cdn.test/a.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "1",
            "profilePic": "https://cdn.test/a.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate { profile_pic: "https://cdn.test/a.png".to_owned() };
    let user = api_for(&server, None).update_profile(&update).await.unwrap();
    assert_eq!(user.profile_pic.as_deref(), Some("https://cdn.test/a.png"));
}

#[tokio::test]
async fn signup_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({ "fullName": "Ada", "email": "a@x.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "2", "fullName": "Ada" })))
        .expect(1)
        .mount(&server)
        .await;

    let data = SignupData { full_name: "Ada".into(), email: "a@x.com".into(), password: "secret1".into() };
    let user = api_for(&server, None).signup(&data).await.unwrap();
    assert_eq!(user.id, "2");
}
