//! HTTP API.
//!
//! Routes:
//! - `GET  /health`                                 : liveness + database ping
//! - `GET  /metrics`                                : Prometheus text format
//! - `/api/{doctor|staff|patient}-salaries/...`     : ledger endpoints, see [`salaries`]
//! - `/api/{doctors|staff|patients}/...`            : payee master data, see [`payees`]

pub mod health;
pub mod payees;
pub mod salaries;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ledger::PayeeCategory;
use crate::metrics::AppMetrics;
use crate::repository::SqlPayeeRepository;

/// Per-category state shared by the salary and payee routes.
pub struct CategoryState {
    pub repository: SqlPayeeRepository,
    pub metrics: Arc<AppMetrics>,
}

pub type CategoryApiState = Arc<CategoryState>;

/// `{ "success": true, "id": ... }` for created resources.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

/// `{ "success": true, "records": [...] }` for listings.
#[derive(Debug, Serialize)]
pub struct RecordsResponse<T> {
    pub success: bool,
    pub records: Vec<T>,
}

/// URL prefix of the ledger routes for a category.
pub fn salaries_prefix(category: PayeeCategory) -> &'static str {
    match category {
        PayeeCategory::Doctor => "/api/doctor-salaries",
        PayeeCategory::Staff => "/api/staff-salaries",
        PayeeCategory::Patient => "/api/patient-salaries",
    }
}

/// URL prefix of the master-data routes for a category.
pub fn payees_prefix(category: PayeeCategory) -> &'static str {
    match category {
        PayeeCategory::Doctor => "/api/doctors",
        PayeeCategory::Staff => "/api/staff",
        PayeeCategory::Patient => "/api/patients",
    }
}

/// Assemble the complete router.
pub fn create_router(pool: SqlitePool, metrics: Arc<AppMetrics>) -> Router {
    let mut app = Router::new()
        .merge(health::router(pool.clone()))
        .merge(
            Router::new()
                .route("/metrics", get(render_metrics))
                .with_state(metrics.clone()),
        );

    for category in PayeeCategory::ALL {
        let state = Arc::new(CategoryState {
            repository: SqlPayeeRepository::new(pool.clone(), category),
            metrics: metrics.clone(),
        });

        app = app
            .nest(salaries_prefix(category), salaries::router(state.clone()))
            .nest(payees_prefix(category), payees::router(state));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn render_metrics(State(metrics): State<Arc<AppMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .expect("metrics response should be valid"),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("metrics error"))
                .expect("metrics error response should be valid")
        }
    }
}
