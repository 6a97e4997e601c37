// handlers/protected/users.rs - GET /api/v1/users/token

use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, Principal};

#[derive(Debug, Serialize)]
pub struct TokenUserResponse {
    pub user: Principal,
}

/// The principal the presented token resolves to.
pub async fn token_user_get(Extension(principal): Extension<Principal>) -> ApiResult<TokenUserResponse> {
    Ok(ApiResponse::success(TokenUserResponse { user: principal }))
}
