//! SessionManager driving the real client against a mock API

mod common;

use std::sync::Arc;

use board_core::{Role, Surface};
use common::{fixture, identity_json, pair, CountingRedirect, Fixture};
use session_manager::{AuthApi, SessionError, SessionManager, SessionPhase};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_for(fx: &Fixture, surface: Surface) -> SessionManager {
    SessionManager::for_surface(Arc::new(fx.client.clone()), fx.store.clone(), surface)
}

async fn mount_token(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": access,
            "refresh": refresh
        })))
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer, access: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("Authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_request_carries_no_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .and(body_json(serde_json::json!({"username": "ada", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "a1",
            "refresh": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = fixture(&server, Surface::Public);
    // Leftover tokens from an earlier session must not leak into login.
    fx.credentials
        .save_credentials(&pair("leftover", "leftover-refresh"))
        .await
        .unwrap();

    let pair = fx.client.authenticate("ada", "pw").await.expect("pair");
    assert_eq!(pair.access, "a1");
    assert_eq!(pair.refresh, "r1");
}

#[tokio::test]
async fn test_register_request_carries_no_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .and(body_json(serde_json::json!({
            "username": "grace",
            "email": "grace@example.com",
            "password": "pw",
            "role": "user"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 7,
            "username": "grace",
            "email": "grace@example.com",
            "role": "user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = fixture(&server, Surface::Public);
    let manager = manager_for(&fx, Surface::Public);
    manager.restore_session().await.unwrap();
    fx.credentials
        .save_credentials(&pair("leftover", "leftover-refresh"))
        .await
        .unwrap();

    manager
        .register("grace", "grace@example.com", "pw", None)
        .await
        .expect("registered");

    // Registration leaves the existing session alone.
    assert!(!fx.credentials.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_duplicate_registration_reports_field_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "username": ["A user with that username already exists."]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = fixture(&server, Surface::Public);
    let manager = manager_for(&fx, Surface::Public);
    manager.restore_session().await.unwrap();

    let err = manager
        .register("ada", "ada@example.com", "pw", Some(Role::User))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, SessionError::Api(_)));
    assert_eq!(
        manager.session().await.error.as_deref(),
        Some("username: A user with that username already exists.")
    );
}

#[tokio::test]
async fn test_public_login_persists_session_and_restores_it() {
    let server = MockServer::start().await;
    mount_token(&server, "a1", "r1").await;
    mount_me(&server, "a1", identity_json(4, "ada", "user")).await;

    let fx = fixture(&server, Surface::Public);
    let manager = manager_for(&fx, Surface::Public);
    manager.restore_session().await.unwrap();
    assert_eq!(manager.session().await.phase(), SessionPhase::Unauthenticated);

    let user = manager.login("ada", "pw").await.expect("login");
    assert_eq!(user.username, "ada");
    assert_eq!(user.role, Role::User);
    assert!(manager.is_authenticated().await);

    assert_eq!(fx.store.len().await, 3);
    assert_eq!(
        fx.credentials.credentials().await.unwrap(),
        Some(pair("a1", "r1"))
    );

    // A fresh process restores from the same storage without network calls.
    let restarted = manager_for(&fx, Surface::Public);
    restarted.restore_session().await.unwrap();
    assert!(restarted.is_authenticated().await);
    assert_eq!(restarted.current_user().await.map(|u| u.id), Some(4));
}

#[tokio::test]
async fn test_bad_password_is_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "No active account found with the given credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = fixture(&server, Surface::Admin);
    let manager = manager_for(&fx, Surface::Admin);
    manager.restore_session().await.unwrap();

    let err = manager.login("admin", "wrong").await.expect_err("rejected");
    assert!(matches!(err, SessionError::InvalidCredentials(_)));
    assert_eq!(
        manager.session().await.error.as_deref(),
        Some("No active account found with the given credentials")
    );
    assert!(fx.credentials.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_admin_login_rejects_non_admin_account() {
    let server = MockServer::start().await;
    mount_token(&server, "a1", "r1").await;
    mount_me(&server, "a1", identity_json(4, "ada", "user")).await;

    let fx = fixture(&server, Surface::Admin);
    let manager = manager_for(&fx, Surface::Admin);
    manager.restore_session().await.unwrap();

    let err = manager.login("ada", "pw").await.expect_err("not an admin");
    assert!(matches!(err, SessionError::AccessDenied { required: Role::Admin }));
    assert_eq!(
        manager.session().await.error.as_deref(),
        Some("Access denied. admin privileges required.")
    );
    assert!(!manager.is_authenticated().await);
    assert!(fx.store.is_empty().await);
}

#[tokio::test]
async fn test_admin_login_accepts_admin_account() {
    let server = MockServer::start().await;
    mount_token(&server, "admin-access", "admin-refresh").await;
    mount_me(&server, "admin-access", identity_json(1, "root", "admin")).await;

    let fx = fixture(&server, Surface::Admin);
    let manager = manager_for(&fx, Surface::Admin);
    manager.restore_session().await.unwrap();

    let user = manager.login("root", "pw").await.expect("admin login");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(
        fx.credentials.access_token().await.unwrap().as_deref(),
        Some("admin-access")
    );
    assert_eq!(fx.credentials.keys().access_token, "admin_access_token");
}

#[tokio::test]
async fn test_expired_session_tears_down_manager() {
    let server = MockServer::start().await;
    mount_token(&server, "a1", "r1").await;
    mount_me(&server, "a1", identity_json(4, "ada", "user")).await;

    Mock::given(method("GET"))
        .and(path("/api/jobs/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Given token not valid for any token type"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token is blacklisted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = fixture(&server, Surface::Public);
    let manager = manager_for(&fx, Surface::Public);
    let redirect = CountingRedirect::default();
    fx.client
        .set_login_redirect(manager.login_redirect(Arc::new(redirect.clone())))
        .await;

    manager.restore_session().await.unwrap();
    manager.login("ada", "pw").await.expect("login");
    assert!(manager.is_authenticated().await);

    let err = fx.client.list_jobs().await.expect_err("expired");
    assert!(matches!(err, board_client::ApiError::SessionExpired(_)));

    assert_eq!(redirect.count(), 1);
    assert!(!manager.is_authenticated().await);
    assert_eq!(manager.session().await.phase(), SessionPhase::Unauthenticated);
    assert!(manager.current_user().await.is_none());
    assert!(fx.store.is_empty().await);
}

#[tokio::test]
async fn test_logout_clears_both_tokens() {
    let server = MockServer::start().await;
    mount_token(&server, "a1", "r1").await;
    mount_me(&server, "a1", identity_json(4, "ada", "user")).await;

    let fx = fixture(&server, Surface::Public);
    let manager = manager_for(&fx, Surface::Public);
    manager.restore_session().await.unwrap();
    manager.login("ada", "pw").await.expect("login");

    manager.logout().await;
    assert!(!manager.is_authenticated().await);
    assert!(fx.store.is_empty().await);
}
