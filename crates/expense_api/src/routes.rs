//! `/api/expenses` handlers.
//!
//! # Invariants
//! - The path `id` is authoritative; any `id` in a request body is ignored.
//! - PUT replaces every field; omitted optional fields become null.
//! - Storage calls run on the blocking pool, never on a runtime worker.

use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use expense_core::{
    core_version, Expense, ExpenseId, ExpenseRepository, ExpenseService, RepoResult,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::Arc;

pub const EXPENSES_PATH: &str = "/api/expenses";

/// Repository bound required to share a service across request workers.
pub trait SharedRepository: ExpenseRepository + Send + Sync + 'static {}

impl<T> SharedRepository for T where T: ExpenseRepository + Send + Sync + 'static {}

/// Router state: the one service instance built at startup.
pub struct AppState<R: ExpenseRepository> {
    service: Arc<ExpenseService<R>>,
}

impl<R: ExpenseRepository> AppState<R> {
    pub fn new(service: Arc<ExpenseService<R>>) -> Self {
        Self { service }
    }
}

impl<R: ExpenseRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Request body for POST and PUT.
///
/// `description` is optional here so that an omitted value reaches the
/// storage-fault path instead of a JSON rejection. A `null` amount reads as
/// `0.0` and an empty `date` string reads as no date, which is what form
/// clients send for untouched inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePayload {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub date: Option<NaiveDate>,
}

impl ExpensePayload {
    /// Converts into a new, unsaved record.
    pub fn into_expense(self) -> Result<Expense, ApiError> {
        let description = self.description.ok_or(ApiError::MissingField("description"))?;
        Ok(Expense {
            id: None,
            description,
            amount: self.amount.unwrap_or(0.0),
            category: self.category,
            date: self.date,
        })
    }
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.trim().is_empty() => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|err| de::Error::custom(format!("invalid date `{text}`: {err}"))),
        _ => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

/// Builds the expense routes (plus `/health`) over `service`.
pub fn expense_router<R: SharedRepository>(service: Arc<ExpenseService<R>>) -> Router {
    let collection = get(list_expenses::<R>).post(create_expense::<R>);
    let item = get(get_expense::<R>)
        .put(update_expense::<R>)
        .delete(delete_expense::<R>);

    Router::new()
        .route("/health", get(health))
        .route(EXPENSES_PATH, collection.clone())
        .route(&format!("{EXPENSES_PATH}/"), collection)
        .route(&format!("{EXPENSES_PATH}/{{id}}"), item)
        .with_state(AppState::new(service))
}

async fn with_service<R, T, F>(state: &AppState<R>, op: F) -> Result<T, ApiError>
where
    R: SharedRepository,
    T: Send + 'static,
    F: FnOnce(&ExpenseService<R>) -> Result<T, ApiError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || op(service.as_ref()))
        .await
        .map_err(|err| ApiError::Worker(err.to_string()))?
}

fn storage<T>(result: RepoResult<T>) -> Result<T, ApiError> {
    result.map_err(ApiError::from)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": core_version() }))
}

/// GET /api/expenses[?category=C]
async fn list_expenses<R: SharedRepository>(
    State(state): State<AppState<R>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = with_service(&state, move |service| match params.category {
        Some(category) => storage(service.get_by_category(&category)),
        None => storage(service.get_all()),
    })
    .await?;

    Ok(Json(expenses))
}

/// GET /api/expenses/{id}
async fn get_expense<R: SharedRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<ExpenseId>,
) -> Result<Json<Expense>, ApiError> {
    let expense = with_service(&state, move |service| {
        storage(service.get_by_id(id))?.ok_or(ApiError::NotFound(id))
    })
    .await?;

    Ok(Json(expense))
}

/// POST /api/expenses
async fn create_expense<R: SharedRepository>(
    State(state): State<AppState<R>>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, ApiError> {
    let expense = payload.into_expense()?;
    let created = with_service(&state, move |service| storage(service.save(&expense))).await?;

    Ok(Json(created))
}

/// PUT /api/expenses/{id}
///
/// Load, overwrite, save. The load and the save are separate statements.
async fn update_expense<R: SharedRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<ExpenseId>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, ApiError> {
    let updated = with_service(&state, move |service| {
        let mut existing = storage(service.get_by_id(id))?.ok_or(ApiError::NotFound(id))?;
        existing.replace_fields(payload.into_expense()?);
        storage(service.save(&existing))
    })
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/expenses/{id}
async fn delete_expense<R: SharedRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<ExpenseId>,
) -> Result<StatusCode, ApiError> {
    with_service(&state, move |service| storage(service.delete(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}
