// handlers/protected/transactions/collection.rs
//
// POST /api/v1/transactions   create a transaction for the principal
// GET  /api/v1/transactions   list the principal's transactions

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{NewTransaction, Transaction, TransactionFilter, TransactionType};
use crate::error::ApiError;
use crate::handlers::utils::read_json;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::state::AppState;

use super::payload::{resolve_category, TransactionPayload};

pub async fn transactions_post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> ApiResult<Transaction> {
    let payload = read_json(payload)?;
    let transaction_type = payload.validate()?;
    let category = resolve_category(&state, &payload.category_name).await?;

    let created = state
        .store
        .transactions
        .create(NewTransaction {
            user_id: principal.id,
            amount: payload.amount,
            category_id: category.id,
            transaction_type,
            transaction_date: payload.transaction_date.unwrap_or_else(|| Utc::now().date_naive()),
            description: payload.description,
        })
        .await?;

    info!(user_id = principal.id, transaction_id = created.id, "transaction created");
    Ok(ApiResponse::created(created))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub transaction_type: Option<String>,
}

impl ListTransactionsQuery {
    /// Empty parameters are treated as absent.
    pub fn into_filter(self) -> Result<TransactionFilter, ApiError> {
        Ok(TransactionFilter {
            start_date: parse_date(self.start_date.as_deref())?,
            end_date: parse_date(self.end_date.as_deref())?,
            transaction_type: match self.transaction_type.as_deref() {
                None | Some("") => None,
                Some(raw) => Some(raw.parse::<TransactionType>().map_err(ApiError::bad_request)?),
            },
        })
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("invalid date: {}, expected YYYY-MM-DD", value))),
    }
}

pub async fn transactions_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Vec<Transaction>> {
    let filter = query.into_filter()?;
    let transactions = state.store.transactions.list_by_user(principal.id, &filter).await?;

    info!(user_id = principal.id, count = transactions.len(), "transactions listed");
    Ok(ApiResponse::success(transactions))
}
