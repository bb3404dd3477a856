use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

const TOKEN: &str = "test-token";

async fn app() -> (Router, Arc<Engine>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    engine.ensure_account("steve").await.unwrap();
    engine.ensure_account("alex").await.unwrap();
    (router(ServerState::new(engine.clone(), TOKEN)), engine)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn requests_without_valid_token_are_rejected() {
    let (app, _engine) = app().await;

    let request = Request::get("/balance/steve").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/balance/steve")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn balance_reports_both_currencies() {
    let (app, _engine) = app().await;

    let (status, body) = send(&app, get("/balance/steve")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "steve");
    assert_eq!(body["balances"]["gold"], "100.00");
    assert_eq!(body["balances"]["silver"], "0.00");

    let (status, body) = send(&app, get("/balance/herobrine")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("herobrine"));
}

#[tokio::test]
async fn pay_moves_money() {
    let (app, engine) = app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/pay",
            json!({"from_user": "steve", "to_user": "alex", "amount": "12.5", "currency": "gold"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_balance"], "87.50");
    assert_eq!(body["to_balance"], "112.50");
    assert_eq!(
        engine.balances("alex").await.unwrap().gold,
        engine::Money::new(11_250)
    );
}

#[tokio::test]
async fn pay_failures_are_bad_requests() {
    let (app, engine) = app().await;

    for body in [
        json!({"from_user": "steve", "to_user": "alex", "amount": "500", "currency": "gold"}),
        json!({"from_user": "steve", "to_user": "nobody", "amount": "1", "currency": "gold"}),
        json!({"from_user": "steve", "to_user": "steve", "amount": "1", "currency": "gold"}),
        json!({"from_user": "steve", "to_user": "alex", "amount": "-3", "currency": "gold"}),
        json!({"from_user": "steve", "to_user": "alex", "amount": "1.234", "currency": "gold"}),
        json!({"from_user": "steve", "to_user": "alex", "amount": "1", "currency": "bronze"}),
        json!({"from_user": "steve", "to_user": "alex", "amount": 5, "currency": "gold"}),
        json!({"from_user": "steve", "amount": "1", "currency": "gold"}),
    ] {
        let (status, response) = send(&app, post_json("/pay", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].is_string());
    }
    assert_eq!(
        engine.balances("steve").await.unwrap().gold,
        engine::Money::from_major(100)
    );
}

#[tokio::test]
async fn unknown_currency_names_the_reason() {
    let (app, _engine) = app().await;

    let (status, response) = send(
        &app,
        post_json(
            "/pay",
            json!({"from_user": "steve", "to_user": "alex", "amount": "1", "currency": "bronze"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("bronze"));

    let (status, response) = send(&app, post_json("/pay", json!({"amount": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
}

#[tokio::test]
async fn businesses_and_profit_collection() {
    let (app, engine) = app().await;
    engine.buy_business("steve", "date_stall").await.unwrap();

    let (status, body) = send(&app, get("/businesses/steve")).await;
    assert_eq!(status, StatusCode::OK);
    let businesses = body["businesses"].as_array().unwrap();
    assert_eq!(businesses.len(), 1);
    assert_eq!(businesses[0]["kind"], "date_stall");
    assert_eq!(businesses[0]["pending_profit"], "0.00");

    let (status, body) = send(&app, post_json("/collect_profit/steve", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collected"]["gold"], "0.00");
    assert_eq!(body["businesses"], 0);

    let (status, _) = send(&app, get("/businesses/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
