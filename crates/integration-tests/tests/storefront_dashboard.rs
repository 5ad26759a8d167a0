//! Integration tests for the seller dashboard.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;
use venture_market_integration_tests::{
    COFFEE_ID, OTHER_SELLER_ID, PRODUCT_ID, SELLER_ID, TestApp, VENTURE_ID, category_json,
    location, product_json, venture_json,
};

async fn mock_categories(app: &TestApp) {
    app.backend
        .mock_async(|when, then| {
            when.method(GET).path("/categories");
            then.status(200).json_body(json!([category_json()]));
        })
        .await;
}

async fn mock_venture(app: &TestApp, owner: uuid::Uuid) {
    app.backend
        .mock_async(|when, then| {
            when.method(GET).path(format!("/ventures/{VENTURE_ID}"));
            then.status(200).json_body(venture_json(owner));
        })
        .await;
}

#[tokio::test]
async fn test_customers_are_forbidden() {
    let app = TestApp::spawn().await;
    app.login_customer().await;

    assert_eq!(app.get("/dashboard").await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_overview_lists_own_ventures() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    let list = app
        .backend
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ventures")
                .query_param("owner", SELLER_ID.to_string());
            then.status(200).json_body(json!([venture_json(SELLER_ID)]));
        })
        .await;

    let response = app.get("/dashboard?success=venture_deleted").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Café Origen"));
    assert!(body.contains(&format!("/dashboard/ventures/{VENTURE_ID}/edit")));
    assert!(body.contains("notice-success"));
    list.assert_async().await;
}

#[tokio::test]
async fn test_create_venture() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    let create = app
        .backend
        .mock_async(|when, then| {
            when.method(POST)
                .path("/ventures")
                .header("authorization", "Bearer tok-sam@example.com")
                .json_body(json!({
                    "name": "Café Origen",
                    "description": "Single-origin beans roasted weekly",
                    "categories": [COFFEE_ID]
                }));
            then.status(201).json_body(venture_json(SELLER_ID));
        })
        .await;

    let coffee = COFFEE_ID.to_string();
    let response = app
        .post_form(
            "/dashboard/ventures",
            &[
                ("name", "Café Origen"),
                ("description", "Single-origin beans roasted weekly"),
                ("categories", &coffee),
            ],
        )
        .await;
    assert_eq!(
        location(&response),
        format!("/dashboard/ventures/{VENTURE_ID}?success=venture_created")
    );
    create.assert_async().await;
}

#[tokio::test]
async fn test_invalid_venture_rerenders_with_errors() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_categories(&app).await;
    let create = app
        .backend
        .mock_async(|when, then| {
            when.method(POST).path("/ventures");
            then.status(201).json_body(venture_json(SELLER_ID));
        })
        .await;

    let response = app
        .post_form(
            "/dashboard/ventures",
            &[("name", "   "), ("description", "Roastery")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("Select at least one category"));
    assert!(body.contains("Roastery"));
    create.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_other_sellers_venture_is_forbidden() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_venture(&app, OTHER_SELLER_ID).await;
    let delete = app
        .backend
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/ventures/{VENTURE_ID}"));
            then.status(204);
        })
        .await;

    let edit = app
        .get(&format!("/dashboard/ventures/{VENTURE_ID}/edit"))
        .await;
    assert_eq!(edit.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_form(&format!("/dashboard/ventures/{VENTURE_ID}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    delete.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_delete_own_venture() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_venture(&app, SELLER_ID).await;
    let delete = app
        .backend
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/ventures/{VENTURE_ID}"));
            then.status(204);
        })
        .await;

    let response = app
        .post_form(&format!("/dashboard/ventures/{VENTURE_ID}/delete"), &[])
        .await;
    assert_eq!(location(&response), "/dashboard?success=venture_deleted");
    delete.assert_async().await;
}

#[tokio::test]
async fn test_failed_venture_delete_returns_with_message() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_venture(&app, SELLER_ID).await;
    app.backend
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/ventures/{VENTURE_ID}"));
            then.status(500).body("boom");
        })
        .await;

    let response = app
        .post_form(&format!("/dashboard/ventures/{VENTURE_ID}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/dashboard/ventures/{VENTURE_ID}?error=backend")
    );
}

#[tokio::test]
async fn test_edit_product_form_is_prefilled() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_categories(&app).await;
    mock_venture(&app, SELLER_ID).await;
    app.backend
        .mock_async(|when, then| {
            when.method(GET).path(format!("/products/{PRODUCT_ID}"));
            then.status(200).json_body(product_json(4));
        })
        .await;

    let response = app
        .get(&format!("/dashboard/products/{PRODUCT_ID}/edit"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("value=\"Dark Roast Beans\""));
    assert!(body.contains("value=\"12.50\""));
    assert!(body.contains("value=\"4\""));
    assert!(body.contains("checked"));
}

#[tokio::test]
async fn test_product_price_is_validated() {
    let app = TestApp::spawn().await;
    app.login_seller().await;
    mock_categories(&app).await;
    mock_venture(&app, SELLER_ID).await;
    let create = app
        .backend
        .mock_async(|when, then| {
            when.method(POST).path("/products");
            then.status(201).json_body(product_json(1));
        })
        .await;

    let response = app
        .post_form(
            &format!("/dashboard/ventures/{VENTURE_ID}/products"),
            &[
                ("name", "Dark Roast Beans"),
                ("description", ""),
                ("price", "-3"),
                ("stock", "1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("field-error"));
    create.assert_hits_async(0).await;
}
