use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::database::models::Transaction;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::auth::Principal;
use crate::state::AppState;

/// Loads the transaction addressed by the `:id` path segment into the
/// request extensions.
pub async fn transaction_context_middleware(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = parse_resource_id(&raw_id)
        .ok_or_else(|| ApiError::bad_request(format!("invalid transaction ID: {}", raw_id)))?;

    let transaction = match state.store.transactions.get_by_id(id).await {
        Ok(transaction) => transaction,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("transaction not found")),
        Err(e) => {
            error!(transaction_id = id, error = %e, "failed to load transaction");
            return Err(ApiError::internal());
        }
    };

    request.extensions_mut().insert(transaction);
    Ok(next.run(request).await)
}

/// Lets the request through only when the loaded transaction belongs to the
/// principal.
pub async fn transaction_ownership_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let (Some(principal), Some(transaction)) = (
        request.extensions().get::<Principal>(),
        request.extensions().get::<Transaction>(),
    ) else {
        error!("ownership check reached without principal or transaction in context");
        return Err(ApiError::internal());
    };

    if transaction.user_id != principal.id {
        warn!(
            user_id = principal.id,
            transaction_id = transaction.id,
            "user does not own transaction"
        );
        return Err(ApiError::unauthorized("user does not own this transaction"));
    }

    Ok(next.run(request).await)
}

/// Positive decimal integer ids only.
pub fn parse_resource_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}
