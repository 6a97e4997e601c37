// handlers/public/auth/password.rs - password reset flow
//
// POST /auth/forgot-password      issue a reset token and mail the link
// GET  /auth/validate-reset-token  check a token before showing the form
// PUT  /auth/reset-password       consume the token and set the new password

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::password::hash_password;
use crate::auth::token::{hash_token, OneTimeToken};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::utils::{read_json, validate_email, validate_password, FieldErrors};
use crate::mail::MailTemplate;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordPayload {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub token: String,
}

pub async fn forgot_password_post(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordPayload>, JsonRejection>,
) -> ApiResult<ForgotPasswordResponse> {
    let payload = read_json(payload)?;
    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&payload.email));
    errors.into_result()?;

    let user = match state.store.users.get_by_email(&payload.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("user not found or is inactive")),
        Err(e) => return Err(e.into()),
    };

    let outstanding = state.store.users.reset_password_token_count(user.id).await?;
    if outstanding >= state.config.mail.max_reset_password_requests {
        warn!(user_id = user.id, outstanding, "maximum password reset requests reached");
        return Err(ApiError::bad_request(
            "maximum password reset requests reached please try again later",
        ));
    }

    let token = OneTimeToken::generate();
    state
        .store
        .users
        .create_reset_password_token(user.id, &token.hash, state.config.mail.reset_password_exp)
        .await?;

    let template = MailTemplate::ResetPassword {
        username: user.username.clone(),
        reset_url: format!("{}/reset-password/{}", state.config.server.frontend_url, token.plain),
    };

    match state
        .mailer
        .send(&template, &user.username, &user.email, state.mail_sandboxed())
        .await
    {
        Ok(status) => info!(status, "password reset email sent"),
        Err(e) => {
            error!(user_id = user.id, error = %e, "error sending password reset email");
            if let Err(delete_err) = state.store.users.delete_reset_password_token(&token.hash).await {
                error!(user_id = user.id, error = %delete_err, "error deleting password reset token");
            }
            return Err(e.into());
        }
    }

    Ok(ApiResponse::success(ForgotPasswordResponse { token: token.plain }))
}

pub async fn validate_reset_token_get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<&'static str> {
    if token.is_empty() {
        return Err(ApiError::bad_request("token is required"));
    }

    if !state.store.users.reset_token_exists(&hash_token(&token)).await? {
        warn!("invalid password reset token");
        return Err(ApiError::bad_request("invalid or expired token"));
    }

    Ok(ApiResponse::success("valid token"))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordPayload {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

pub async fn reset_password_put(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordPayload>, JsonRejection>,
) -> ApiResult<&'static str> {
    let payload = read_json(payload)?;
    let mut errors = FieldErrors::new();
    if payload.token.is_empty() {
        errors.add("token", "token is required");
    }
    errors.check("password", validate_password(&payload.password));
    errors.into_result()?;

    let password_hash = hash_password(&payload.password)?;
    match state
        .store
        .users
        .reset_password(&hash_token(&payload.token), &password_hash)
        .await
    {
        Ok(()) => {
            info!("password reset successfully");
            Ok(ApiResponse::success("password reset successfully"))
        }
        Err(StoreError::NotFound) => Err(ApiError::bad_request("invalid or expired token")),
        Err(e) => Err(e.into()),
    }
}
