// handlers/public/users.rs - PUT /api/v1/users/activate/:token

use axum::extract::{Path, State};
use tracing::info;

use crate::auth::token::hash_token;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Activates the account owning an unexpired invitation token.
pub async fn activate_put(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<()> {
    match state.store.users.activate(&hash_token(&token)).await {
        Ok(()) => {
            info!("user activated");
            Ok(ApiResponse::<()>::no_content())
        }
        Err(StoreError::NotFound) => Err(ApiError::not_found("invitation not found or expired")),
        Err(e) => Err(e.into()),
    }
}
