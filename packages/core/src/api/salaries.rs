//! Ledger endpoints, mounted once per payee category.
//!
//! Routes (relative to `/api/{doctor|staff|patient}-salaries`):
//! - `POST   /save-monthly-records`     : run the carry-forward batch
//! - `GET    /?month=&year=`            : monthly read model
//! - `POST   /payments`                 : record a payment event
//! - `POST   /advances`                 : record an advance event
//! - `GET    /:payee_id/history`        : saved ledger rows, newest first
//! - `DELETE /:payee_id/records?month=&year=`: ledger correction

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CategoryApiState, CreatedResponse, RecordsResponse};
use crate::error::AppError;
use crate::ledger::{
    monthly_overview, run_monthly_carry_forward, Amount, LedgerRecord, LedgerView,
    PayeeCategory, PayeeRepository, Period,
};
use crate::repository::{EventKind, NewEvent};

pub fn router(state: CategoryApiState) -> Router {
    Router::new()
        .route("/", get(list_monthly))
        .route("/save-monthly-records", post(save_monthly_records))
        .route("/payments", post(record_payment))
        .route("/advances", post(record_advance))
        .route("/:payee_id/history", get(payee_history))
        .route("/:payee_id/records", delete(delete_record))
        .with_state(state)
}

// ---- Request / response shapes ----

/// `month` and `year`, from a JSON body or a query string. Both are required;
/// they are optional here so a missing value yields our own 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodParams {
    pub fn into_period(self) -> Result<Period, AppError> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Ok(Period::new(month, year)?),
            _ => Err(AppError::Validation("month and year are required".to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMonthlyRecordsResponse {
    pub success: bool,
    pub message: String,
    pub records_processed: usize,
    pub carry_forward_updates: usize,
}

#[derive(Debug, Serialize)]
pub struct MonthlyOverviewResponse {
    pub success: bool,
    pub category: PayeeCategory,
    pub month: u32,
    pub year: i32,
    pub records: Vec<LedgerView>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payee_id: i64,
    pub amount: Amount,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub payee_id: i64,
    pub amount: Amount,
    pub advanced_on: NaiveDate,
    pub note: Option<String>,
}

// ---- Handlers ----

/// `POST /save-monthly-records`: recompute and persist every eligible
/// payee's ledger row for the month.
pub async fn save_monthly_records(
    State(state): State<CategoryApiState>,
    body: Result<Json<PeriodParams>, JsonRejection>,
) -> Result<Json<SaveMonthlyRecordsResponse>, AppError> {
    let Json(body) = body?;
    let period = body.into_period()?;
    let category = state.repository.category();
    let label = category.as_str();

    let timer = state
        .metrics
        .carry_forward_duration
        .with_label_values(&[label])
        .start_timer();
    let result = run_monthly_carry_forward(&state.repository, period).await;
    timer.observe_duration();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            state
                .metrics
                .carry_forward_runs_total
                .with_label_values(&[label, "failure"])
                .inc();
            return Err(err.into());
        }
    };

    state
        .metrics
        .carry_forward_runs_total
        .with_label_values(&[label, "success"])
        .inc();
    state
        .metrics
        .ledger_records_written_total
        .with_label_values(&[label])
        .inc_by(outcome.records_processed as f64);

    Ok(Json(SaveMonthlyRecordsResponse {
        success: true,
        message: format!(
            "Saved {} {} records for {}",
            outcome.records_processed, category, period
        ),
        records_processed: outcome.records_processed,
        carry_forward_updates: outcome.carry_forward_updates,
    }))
}

/// `GET /?month=&year=`: saved rows, or live figures where none are saved.
pub async fn list_monthly(
    State(state): State<CategoryApiState>,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> Result<Json<MonthlyOverviewResponse>, AppError> {
    let Query(params) = params?;
    let period = params.into_period()?;
    let records = monthly_overview(&state.repository, period).await?;

    Ok(Json(MonthlyOverviewResponse {
        success: true,
        category: state.repository.category(),
        month: period.month(),
        year: period.year(),
        records,
    }))
}

/// `POST /payments`
pub async fn record_payment(
    State(state): State<CategoryApiState>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let Json(body) = body?;
    let event = NewEvent {
        payee_id: body.payee_id,
        amount: body.amount,
        date: body.paid_on,
        note: body.note,
    };
    record_event(&state, EventKind::Payment, event).await
}

/// `POST /advances`
pub async fn record_advance(
    State(state): State<CategoryApiState>,
    body: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let Json(body) = body?;
    let event = NewEvent {
        payee_id: body.payee_id,
        amount: body.amount,
        date: body.advanced_on,
        note: body.note,
    };
    record_event(&state, EventKind::Advance, event).await
}

async fn record_event(
    state: &CategoryApiState,
    kind: EventKind,
    event: NewEvent,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    if event.amount <= 0 {
        return Err(AppError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    let category = state.repository.category();
    let id = state
        .repository
        .record_event(kind, &event)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("{} {} not found", category, event.payee_id))
        })?;

    state
        .metrics
        .events_recorded_total
        .with_label_values(&[category.as_str(), kind.as_str()])
        .inc();
    tracing::info!(
        "Recorded {} {} for {} {} on {}",
        kind.as_str(),
        event.amount,
        category,
        event.payee_id,
        event.date
    );

    Ok((StatusCode::CREATED, Json(CreatedResponse { success: true, id })))
}

/// `GET /:payee_id/history`
pub async fn payee_history(
    State(state): State<CategoryApiState>,
    payee_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<RecordsResponse<LedgerRecord>>, AppError> {
    let Path(payee_id) = payee_id?;
    if !state.repository.payee_exists(payee_id).await? {
        return Err(AppError::NotFound(format!(
            "{} {} not found",
            state.repository.category(),
            payee_id
        )));
    }

    let records = state.repository.ledger_history(payee_id).await?;
    Ok(Json(RecordsResponse {
        success: true,
        records,
    }))
}

/// `DELETE /:payee_id/records?month=&year=`: remove one saved row.
pub async fn delete_record(
    State(state): State<CategoryApiState>,
    payee_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Path(payee_id) = payee_id?;
    let Query(params) = params?;
    let period = params.into_period()?;

    if state.repository.delete_ledger(payee_id, period).await? {
        tracing::info!(
            "Deleted {} ledger record for payee {} in {}",
            state.repository.category(),
            payee_id,
            period
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No ledger record for payee {} in {}",
            payee_id, period
        )))
    }
}
