use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use gasto_api::{ApiClient, ApiError, AuthContext, ClientConfig, Endpoints, Messages};
use gasto_core::{DateRange, Recommendation, TxnKind, aggregate};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String, auth: AuthContext) -> ApiClient {
    ApiClient::new(
        ClientConfig {
            base_url,
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(5),
        },
        auth,
    )
    .unwrap()
}

fn october() -> DateRange {
    DateRange::parse("2025-10-01", "2025-10-31").unwrap()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn test_statistics_sends_range_and_token() {
    let app = Router::new().route(
        "/api/transactions/statistics",
        get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
            assert_eq!(bearer(&headers).as_deref(), Some("Bearer tok-1"));
            assert_eq!(q.get("from").map(String::as_str), Some("2025-10-01"));
            assert_eq!(q.get("to").map(String::as_str), Some("2025-10-31"));
            Json(json!({"ingresos": 2000, "total_expense": 1200.0}))
        }),
    );
    let base = serve(app).await;

    let stats = client(base, AuthContext::bearer("tok-1")).statistics(&october()).await.unwrap();
    assert_eq!(stats.total_income, Decimal::from(2000));
    assert_eq!(stats.total_expense, Decimal::from(1200));
    assert_eq!(stats.balance, Decimal::from(800));
}

#[tokio::test]
async fn test_unauthorized_maps_to_not_authenticated_message() {
    let app = Router::new().route(
        "/api/transactions/statistics",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Token no proporcionado"})),
            )
        }),
    );
    let base = serve(app).await;

    let err = client(base, AuthContext::anonymous())
        .statistics(&october())
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);

    let messages = Messages::default();
    assert_eq!(err.user_message(&messages), messages.not_authenticated);
}

#[tokio::test]
async fn test_server_detail_becomes_user_message() {
    let app = Router::new().route(
        "/api/recommendations/",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Base de datos no disponible"})),
            )
        }),
    );
    let base = serve(app).await;

    let err = client(base, AuthContext::anonymous()).recommendations().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.user_message(&Messages::default()), "Base de datos no disponible");
}

#[tokio::test]
async fn test_transactions_envelope_feeds_aggregator() {
    let app = Router::new().route(
        "/api/transactions",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            assert_eq!(q.get("limit").map(String::as_str), Some("200"));
            assert_eq!(q.get("date_from").map(String::as_str), Some("2025-10-01"));
            Json(json!({"items": [
                {"id": "1", "amount": 1000, "type": "ingreso", "category": "salario", "date": "2025-10-01"},
                {"id": "2", "amount": 900, "type": "gasto", "category": "food", "date": "2025-10-03"},
                {"id": "3", "amount": "-600", "category": "transport", "date": "2025-10-04T08:00:00Z"}
            ]}))
        }),
    );
    let base = serve(app).await;

    let txns = client(base, AuthContext::anonymous())
        .transactions(&october(), 200)
        .await
        .unwrap();
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[1].kind, Some(TxnKind::Expense));
    assert_eq!(txns[2].date, NaiveDate::from_ymd_opt(2025, 10, 4).unwrap());

    let agg = aggregate(&txns, &october());
    assert_eq!(agg.summary.total_expense, Decimal::from(1500));
    assert_eq!(agg.top_categories()[0].category, "food");
}

#[tokio::test]
async fn test_unexpected_shape_is_reported() {
    let app = Router::new().route(
        "/api/transactions",
        get(|| async { Json(json!({"data": "nope"})) }),
    );
    let base = serve(app).await;

    let err = client(base, AuthContext::anonymous())
        .transactions(&october(), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::DataShape(_)), "got {err:?}");
}

#[tokio::test]
async fn test_apply_posts_confirmed_request() {
    let app = Router::new().route(
        "/api/recommendations/apply",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["rec_type"], "suggest_goal");
            assert_eq!(body["confirm"], true);
            Json(json!({"success": true, "detail": {"success": true, "detail": "Meta creada con id 42"}}))
        }),
    );
    let base = serve(app).await;

    let rec = Recommendation::new("suggest_goal", "Crea una meta de ahorro", "10%", 0.7);
    let updated = client(base, AuthContext::anonymous()).apply(&rec).await.unwrap();
    assert!(updated.applied);
    assert_eq!(updated.kind, "suggest_goal");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}"), AuthContext::anonymous())
        .statistics(&october())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}
