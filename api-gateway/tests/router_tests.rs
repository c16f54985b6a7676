use std::sync::Arc;

use api_gateway::{app, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ledger_service::BalanceService;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let state = Arc::new(AppState {
        balance_service: Arc::new(BalanceService::new()),
    });
    app(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_envelope() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_topup_then_get_balance() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/account/topup",
            json!({"accountId": "u1", "amount": 100}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["balance"], "100");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account/balance/u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], "100");
}

#[tokio::test]
async fn test_balance_unknown_account_is_404_envelope() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account/balance/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("ghost"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_withdraw_unknown_account_is_404() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/account/withdraw",
            json!({"accountId": "ghost", "amount": 10}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_non_positive_amount_is_400() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/account/topup",
            json!({"accountId": "u1", "amount": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_label_entry_is_a_post_mutation() {
    let app = test_app();

    app.clone()
        .oneshot(post_json(
            "/account/topup",
            json!({"accountId": "u1", "amount": 100}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/account/labelEntry",
            json!({"payerId": "u2", "beneficiaryId": "u1", "amount": 20}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["balance"], "80");

    // GET on the mutation path is not routed
    let response = app
        .oneshot(
            Request::builder()
                .uri("/account/labelEntry")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
