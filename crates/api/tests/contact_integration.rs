//! Integration tests for the public contact form.

mod common;

use axum::http::{Method, StatusCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};

use atelier_api::services::email::MockMailer;
use common::{json_request, parse_response_body, request, test_config, TestApp, ADMIN_EMAIL};

fn submission() -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "name": name,
        "email": email,
        "message": "We are opening a second studio and need signage and a new site.",
        "company": "North & Pine",
        "budget": "10-20k",
        "phone": "+420 777 000 111"
    })
}

async fn submit(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let response = app
        .send(json_request(Method::POST, "/api/send-email", body))
        .await;
    let status = response.status();
    (status, parse_response_body(response).await)
}

// ============================================================================
// Delivery
// ============================================================================

#[tokio::test]
async fn test_valid_submission_notifies_confirms_and_records() {
    let app = TestApp::new();
    let body = submission();
    let sender = body["email"].as_str().unwrap().to_string();

    let (status, response) = submit(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "success": true }));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
    assert_eq!(sent[0].reply_to.as_deref(), Some(sender.as_str()));
    assert!(sent[0].body_text.contains("+420 777 000 111"));
    assert_eq!(sent[1].to, sender);

    let stored = app.inquiries.inquiries();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email, sender);
    assert_eq!(stored[0].company.as_deref(), Some("North & Pine"));
    assert_eq!(stored[0].client_id, None);
}

#[tokio::test]
async fn test_configured_recipient_receives_notification() {
    let mut config = test_config();
    config.contact.recipient = "hello@atelier.studio".to_string();
    config.contact.send_confirmation = false;
    let app = TestApp::with_config(config);

    let (status, _) = submit(&app, submission()).await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "hello@atelier.studio");
}

#[tokio::test]
async fn test_notification_failure_is_server_error() {
    let app = TestApp::with_mailer(MockMailer::failing_for(ADMIN_EMAIL));

    let (status, body) = submit(&app, submission()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(app.inquiries.inquiries().is_empty());
}

// ============================================================================
// Screening
// ============================================================================

#[tokio::test]
async fn test_honeypot_submission_is_silently_dropped() {
    let app = TestApp::new();
    let mut body = submission();
    body["website"] = json!("http://cheap-pills.example");

    let (status, response) = submit(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "success": true }));
    assert!(app.mailer.sent().is_empty());
    assert!(app.inquiries.inquiries().is_empty());
}

#[tokio::test]
async fn test_spam_submission_is_silently_dropped() {
    let app = TestApp::new();
    let mut body = submission();
    body["message"] = json!("Rank your website first! Click here for cheap backlinks.");

    let (status, response) = submit(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "success": true }));
    assert!(app.mailer.sent().is_empty());
    assert!(app.inquiries.inquiries().is_empty());
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_malformed_email_is_rejected() {
    let app = TestApp::new();
    let mut body = submission();
    body["email"] = json!("not-an-email");

    let (status, response) = submit(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Invalid email address");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = TestApp::new();

    let (status, response) = submit(&app, json!({ "name": "Jana" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "validation_error");
    assert!(response["message"].as_str().is_some());
}

#[tokio::test]
async fn test_overlong_message_is_rejected() {
    let app = TestApp::new();
    let mut body = submission();
    body["message"] = json!("x".repeat(5001));

    let (status, _) = submit(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    let app = TestApp::new();

    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/send-email")
        .header("user-agent", common::BROWSER_UA)
        .body(axum::body::Body::from("name=x&email=y"))
        .unwrap();
    let response = app.send(req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Expected a JSON request body");
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let app = TestApp::new();

    let response = app.send(request(Method::GET, "/api/send-email")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "method_not_allowed");
}
