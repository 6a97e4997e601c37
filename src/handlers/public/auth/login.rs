// handlers/public/auth/login.rs - POST /api/v1/auth/login

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::auth::Claims;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::utils::{read_json, validate_email, validate_password, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginUserPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUserResponse {
    pub token: String,
}

/// Exchanges email and password of an active user for a signed access token.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginUserPayload>, JsonRejection>,
) -> ApiResult<LoginUserResponse> {
    let payload = read_json(payload)?;
    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&payload.email));
    errors.check("password", validate_password(&payload.password));
    errors.into_result()?;

    let user = match state.store.users.get_by_email(&payload.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("user not found")),
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "failed to compare password");
        return Err(e.into());
    }

    let auth = &state.config.auth;
    let claims = Claims::new(user.id, user.role.name.clone(), &auth.issuer, auth.token_exp);
    let token = state.authenticator.generate_token(&claims)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(ApiResponse::success(LoginUserResponse { token }))
}
