#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Login, logout, idle timeout, culture switching and health.

use axum::http::StatusCode;
use serde_json::Value;

mod common;
use common::{
    BACKDATE_PATH, FakeIdentityApi, GOOD_PASSWORD, TestApp, body_string, location,
    notification_lines, test_config,
};

// =============================================================================
// Anonymous access
// =============================================================================

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    for path in ["/dashboard", "/companies", "/applications/5/edit"] {
        let response = browser.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {path}");
        assert_eq!(location(&response), "/login", "GET {path}");
    }
}

#[tokio::test]
async fn unknown_paths_fall_back_by_session_state() {
    let app = TestApp::new().await;

    let mut anonymous = app.browser();
    let response = anonymous.get("/no/such/page").await;
    assert_eq!(location(&response), "/login");

    let mut user = app.logged_in("alice").await;
    let response = user.get("/no/such/page").await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn login_page_renders_companies_and_cultures() {
    let app = TestApp::new().await;
    let body = app.browser().page("/login").await;

    assert!(body.contains("Identity Console"));
    assert!(body.contains(r#"name="companyId""#));
    assert!(body.contains(r#"name="password""#));
    assert!(body.contains("Spanish"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_stores_token_and_lands_on_dashboard() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let body = browser.page("/dashboard").await;
    assert!(body.contains("Welcome back"));
    assert!(body.contains("Administration"));
    assert!(body.contains("Companies"));

    let requests = app.api.token_requests.lock().unwrap();
    let request = requests.last().unwrap();
    assert_eq!(request.grant_type, "ClientCredentials");
    assert_eq!(request.application_id, "console");
    assert_eq!(request.user_id, "alice");
}

#[tokio::test]
async fn login_page_sends_authenticated_users_on() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let response = browser.get("/login").await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    let response = browser.login("alice", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Wrong user name or password"));
    assert!(!body.contains("wrong-password"));

    let response = browser.get("/dashboard").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn incomplete_login_lists_every_problem_once() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    let token = browser.csrf_token("/login").await;

    let response = browser
        .post_form(
            "/login",
            &[("csrf_token", token.as_str()), ("userName", "al"), ("password", "")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;

    assert_eq!(body.matches("Please fix the highlighted fields").count(), 1);
    assert_eq!(notification_lines(&body).len(), 3);
    assert!(app.api.token_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn login_without_csrf_token_is_refused() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    browser.page("/login").await;

    let response = browser
        .post_form(
            "/login",
            &[
                ("companyId", common::COMPANY_GUID),
                ("userName", "alice"),
                ("password", GOOD_PASSWORD),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.api.token_requests.lock().unwrap().is_empty());
}

// =============================================================================
// Logout and idle timeout
// =============================================================================

#[tokio::test]
async fn logout_clears_token_and_says_so() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let response = browser.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = browser.page("/login").await;
    assert!(body.contains("You have been logged out"));

    let response = browser.get("/companies").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn idle_session_is_logged_off_on_next_request() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let response = browser.post_form(BACKDATE_PATH, &[]).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = browser.get("/companies").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = browser.page("/login").await;
    assert!(body.contains("Logged out after inactivity"));

    let response = browser.get("/dashboard").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn idle_timeout_elapsing_in_real_time_keeps_culture_and_notice() {
    let mut config = test_config();
    config.auto_logoff_minutes = 1;
    let app = TestApp::with(config, FakeIdentityApi::default()).await;
    let mut browser = app.logged_in("alice").await;
    let token = browser.csrf_token("/dashboard").await;
    browser
        .post_form(
            "/culture",
            &[("culture_id", "es-MX"), ("csrf_token", token.as_str())],
        )
        .await;

    tokio::time::sleep(std::time::Duration::from_secs(61)).await;

    let response = browser.get("/companies").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = browser.page("/login").await;
    assert!(body.contains("Sesion cerrada por inactividad"));
    assert!(body.contains("Consola de Identidad"));
}

#[tokio::test]
async fn client_side_idle_logout_uses_the_same_message() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let response = browser.get("/logout?reason=idle").await;
    assert_eq!(location(&response), "/login");

    let body = browser.page("/login").await;
    assert!(body.contains("Logged out after inactivity"));
}

#[tokio::test]
async fn idle_script_flushes_throttled_activity_later() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    let response = browser.get("/static/console.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    let script = body_string(response).await;
    assert!(script.contains("/session/activity"));
    assert!(script.contains("lastBeat + heartbeatEvery - now"));
}

#[tokio::test]
async fn activity_heartbeat_reports_time_left() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;

    let response = browser
        .post_form("/session/activity", &[("kind", "keydown")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["kind"], "key");
    let remaining = json["remainingMs"].as_i64().unwrap();
    assert!(remaining > 14 * 60 * 1000 && remaining <= 15 * 60 * 1000);

    let response = browser
        .post_form("/session/activity", &[("kind", "sneeze")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activity_heartbeat_needs_a_session() {
    let app = TestApp::new().await;
    let response = app
        .browser()
        .post_form("/session/activity", &[("kind", "pointer")])
        .await;
    assert_eq!(location(&response), "/login");
}

// =============================================================================
// Culture
// =============================================================================

#[tokio::test]
async fn culture_switch_reloads_translations() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    let token = browser.csrf_token("/login").await;

    let response = browser
        .post_form(
            "/culture",
            &[
                ("culture_id", "es-MX"),
                ("csrf_token", token.as_str()),
                ("redirect_to", "/login"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = browser.page("/login").await;
    assert!(body.contains(r#"<html lang="es-MX">"#));
    assert!(body.contains("Consola de Identidad"));
}

#[tokio::test]
async fn culture_survives_logout() {
    let app = TestApp::new().await;
    let mut browser = app.logged_in("alice").await;
    let token = browser.csrf_token("/dashboard").await;

    browser
        .post_form(
            "/culture",
            &[("culture_id", "es-MX"), ("csrf_token", token.as_str())],
        )
        .await;
    browser.get("/logout").await;

    let body = browser.page("/login").await;
    assert!(body.contains("Consola de Identidad"));
}

#[tokio::test]
async fn culture_switch_ignores_foreign_redirects_and_bad_tokens() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    let token = browser.csrf_token("/login").await;

    let response = browser
        .post_form(
            "/culture",
            &[
                ("culture_id", "es-MX"),
                ("csrf_token", token.as_str()),
                ("redirect_to", "//evil.test/phish"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/login");

    let response = browser
        .post_form(
            "/culture",
            &[("culture_id", "en-US"), ("csrf_token", "forged")],
        )
        .await;
    assert_eq!(location(&response), "/login");

    // The forged request changed nothing
    let body = browser.page("/login").await;
    assert!(body.contains("Consola de Identidad"));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_identity_api_reachability() {
    let app = TestApp::new().await;
    let response = app.browser().get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["identity_api"], true);

    let down = FakeIdentityApi {
        reachable: false,
        ..FakeIdentityApi::default()
    };
    let app = TestApp::with(test_config(), down).await;
    let response = app.browser().get("/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "unhealthy");
}
