//! Integration tests for login, registration, logout and session revalidation.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;
use venture_market_integration_tests::{TestApp, customer_json, location, seller_json};

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Faccount");
}

#[tokio::test]
async fn test_htmx_request_without_login_is_unauthorized() {
    let app = TestApp::spawn().await;
    let response = app.htmx_get("/cart").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_lands_by_role_and_session_persists() {
    let app = TestApp::spawn().await;
    app.login_customer().await;

    let account = app.get("/account").await;
    assert_eq!(account.status(), StatusCode::OK);
    let body = account.text().await.unwrap();
    assert!(body.contains("Ana Buyer"));
    assert!(body.contains("ana@example.com"));
    assert!(body.contains("Customer"));

    let seller = TestApp::spawn().await;
    seller.backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/login");
            then.status(200)
                .json_body(json!({"token": "tok-sam", "user": seller_json()}));
        })
        .await;
    let response = seller
        .post_form(
            "/auth/login",
            &[("email", "sam@example.com"), ("password", "correct-horse")],
        )
        .await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_login_honours_local_next_only() {
    let app = TestApp::spawn().await;
    app.backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/login");
            then.status(200)
                .json_body(json!({"token": "tok-ana", "user": customer_json()}));
        })
        .await;

    let response = app
        .post_form(
            "/auth/login",
            &[
                ("email", "ana@example.com"),
                ("password", "correct-horse"),
                ("next", "https://evil.example/steal"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/");

    // Already logged in: the login page forwards to the local target
    let response = app.get("/auth/login?next=%2Fcart").await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_wrong_password_rerenders_form() {
    let app = TestApp::spawn().await;
    app.backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/login");
            then.status(401)
                .json_body(json!({"message": "Bad credentials"}));
        })
        .await;

    let response = app
        .post_form(
            "/auth/login",
            &[("email", "ana@example.com"), ("password", "wrong")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains("value=\"ana@example.com\""));

    assert_eq!(app.get("/account").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_invalid_login_never_reaches_backend() {
    let app = TestApp::spawn().await;
    let login = app
        .backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/login");
            then.status(200);
        })
        .await;

    let response = app
        .post_form("/auth/login", &[("email", "not-an-email"), ("password", "")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("field-error"));
    login.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_register_then_logged_in() {
    let app = TestApp::spawn().await;
    let register = app
        .backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/register").json_body(json!({
                "name": "Sam Maker",
                "email": "sam@example.com",
                "password": "s3cure-pass",
                "role": "ENTREPRENEUR"
            }));
            then.status(201).json_body(seller_json());
        })
        .await;
    app.backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/login");
            then.status(200)
                .json_body(json!({"token": "tok-sam", "user": seller_json()}));
        })
        .await;

    let response = app
        .post_form(
            "/auth/register",
            &[
                ("name", "Sam Maker"),
                ("email", "sam@example.com"),
                ("password", "s3cure-pass"),
                ("password_confirm", "s3cure-pass"),
                ("role", "ENTREPRENEUR"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/dashboard");
    register.assert_async().await;
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.backend
        .mock_async(|when, then| {
            when.method(POST).path("/users/register");
            then.status(409)
                .json_body(json!({"message": "Email already registered"}));
        })
        .await;

    let response = app
        .post_form(
            "/auth/register",
            &[
                ("name", "Ana Buyer"),
                ("email", "ana@example.com"),
                ("password", "s3cure-pass"),
                ("password_confirm", "s3cure-pass"),
                ("role", "CUSTOMER"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(response.text().await.unwrap().contains("Email already registered"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::spawn().await;
    app.login_customer().await;
    assert_eq!(app.get("/account").await.status(), StatusCode::OK);

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/auth/login?success=logged_out");

    assert_eq!(app.get("/account").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_revoked_token_logs_user_out() {
    let app = TestApp::spawn_with(&[("AUTH_REVALIDATE_SECS", "0")]).await;
    app.login_customer().await;

    let me = app
        .backend
        .mock_async(|when, then| {
            when.method(GET)
                .path("/users/me")
                .header("authorization", "Bearer tok-ana@example.com");
            then.status(401);
        })
        .await;

    let response = app.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    me.assert_async().await;
}

#[tokio::test]
async fn test_backend_outage_keeps_user_logged_in() {
    let app = TestApp::spawn_with(&[("AUTH_REVALIDATE_SECS", "0")]).await;
    app.login_customer().await;

    app.backend
        .mock_async(|when, then| {
            when.method(GET).path("/users/me");
            then.status(503);
        })
        .await;

    assert_eq!(app.get("/account").await.status(), StatusCode::OK);
}
