// handlers/protected/transactions/record.rs
//
// GET    /api/v1/transactions/:id
// PATCH  /api/v1/transactions/:id
// DELETE /api/v1/transactions/:id

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use tracing::info;

use crate::database::models::Transaction;
use crate::handlers::utils::read_json;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::payload::{resolve_category, TransactionPayload};

pub async fn transaction_get(Extension(transaction): Extension<Transaction>) -> ApiResult<Transaction> {
    Ok(ApiResponse::success(transaction))
}

/// Replaces amount, type, category and description. The date is kept unless
/// the body names a new one.
pub async fn transaction_patch(
    State(state): State<AppState>,
    Extension(mut transaction): Extension<Transaction>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> ApiResult<Transaction> {
    let payload = read_json(payload)?;
    let transaction_type = payload.validate()?;
    let category = resolve_category(&state, &payload.category_name).await?;

    transaction.amount = payload.amount;
    transaction.transaction_type = transaction_type;
    transaction.description = payload.description;
    transaction.category_id = category.id;
    transaction.category_name = category.name;
    if let Some(date) = payload.transaction_date {
        transaction.transaction_date = date;
    }

    let updated = state.store.transactions.update(&transaction).await?;

    info!(transaction_id = updated.id, "transaction updated");
    Ok(ApiResponse::success(updated))
}

pub async fn transaction_delete(
    State(state): State<AppState>,
    Extension(transaction): Extension<Transaction>,
) -> ApiResult<()> {
    state.store.transactions.delete_by_id(transaction.id).await?;

    info!(transaction_id = transaction.id, "transaction deleted");
    Ok(ApiResponse::<()>::no_content())
}
