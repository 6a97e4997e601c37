// handlers/public/auth/invitation.rs - GET /api/v1/auth/validate-invitation-token/:token

use axum::extract::{Path, State};

use crate::auth::token::hash_token;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn validate_invitation_get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<&'static str> {
    if token.is_empty() {
        return Err(ApiError::bad_request("token is required"));
    }

    if !state.store.users.invitation_exists(&hash_token(&token)).await? {
        tracing::warn!("invalid invitation token");
        return Err(ApiError::bad_request("invalid token"));
    }

    Ok(ApiResponse::success("valid token"))
}
