//! Payee master-data endpoints, mounted once per category.
//!
//! Routes (relative to `/api/{doctors|staff|patients}`):
//! - `POST  /`    : create
//! - `GET   /`    : list
//! - `GET   /:id` : fetch one
//! - `PATCH /:id` : partial update (name, obligation, status, join date)

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::{CategoryApiState, CreatedResponse, RecordsResponse};
use crate::error::AppError;
use crate::ledger::PayeeRepository;
use crate::repository::{NewPayee, Payee, PayeeUpdate};

pub fn router(state: CategoryApiState) -> Router {
    Router::new()
        .route("/", get(list_payees).post(create_payee))
        .route("/:id", get(get_payee).patch(update_payee))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PayeeResponse {
    pub success: bool,
    pub record: Payee,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_obligation(amount: i64) -> Result<(), AppError> {
    if amount < 0 {
        return Err(AppError::Validation(
            "monthly_obligation must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn not_found(state: &CategoryApiState, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", state.repository.category(), id))
}

/// `POST /`: register a payee.
pub async fn create_payee(
    State(state): State<CategoryApiState>,
    body: Result<Json<NewPayee>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let Json(body) = body?;
    validate_name(&body.name)?;
    validate_obligation(body.monthly_obligation)?;

    let id = state.repository.create_payee(&body).await?;
    tracing::info!("Created {} {} ({})", state.repository.category(), id, body.name);

    Ok((StatusCode::CREATED, Json(CreatedResponse { success: true, id })))
}

/// `GET /`
pub async fn list_payees(
    State(state): State<CategoryApiState>,
) -> Result<Json<RecordsResponse<Payee>>, AppError> {
    let records = state.repository.list_payees().await?;
    Ok(Json(RecordsResponse {
        success: true,
        records,
    }))
}

/// `GET /:id`
pub async fn get_payee(
    State(state): State<CategoryApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PayeeResponse>, AppError> {
    let Path(id) = id?;
    let record = state
        .repository
        .get_payee(id)
        .await?
        .ok_or_else(|| not_found(&state, id))?;

    Ok(Json(PayeeResponse {
        success: true,
        record,
    }))
}

/// `PATCH /:id`: only the fields present in the body change.
pub async fn update_payee(
    State(state): State<CategoryApiState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PayeeUpdate>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    if let Some(name) = body.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(amount) = body.monthly_obligation {
        validate_obligation(amount)?;
    }

    if state.repository.update_payee(id, &body).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&state, id))
    }
}
