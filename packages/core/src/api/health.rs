use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::SqlitePool;

pub fn router(pool: SqlitePool) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}

/// `GET /health`: `ok` when the database answers, `503` otherwise.
pub async fn health(State(pool): State<SqlitePool>) -> impl IntoResponse {
    let (status, body) = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(err) => {
            tracing::warn!("Health check database ping failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    };

    Response::builder()
        .status(status)
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
        .body(Body::from(body))
        .expect("health response should be valid")
}
