use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::database::models::User;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user resolved from a bearer token
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub role_level: i32,
    pub is_active: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.name,
            role_level: user.role.level,
            is_active: user.is_active,
        }
    }
}

/// Validates the bearer token, resolves the principal and attaches it to the
/// request extensions.
pub async fn auth_token_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(|msg| {
        warn!(path = %request.uri().path(), "{}", msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = state.authenticator.validate_token(&token).map_err(|e| {
        warn!(error = %e, "rejected auth token");
        ApiError::unauthorized("invalid auth token")
    })?;

    let user_id = claims.user_id().map_err(|e| {
        warn!(error = %e, "token subject is not a user id");
        ApiError::unauthorized("invalid user ID in token")
    })?;

    let user = match state.store.users.get_by_id(user_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!(user_id, "token subject does not resolve to an active user");
            return Err(ApiError::unauthorized("user not found"));
        }
        Err(e) => {
            error!(user_id, error = %e, "failed to load principal");
            return Err(ApiError::internal());
        }
    };

    request.extensions_mut().insert(Principal::from(user));
    Ok(next.run(request).await)
}

/// Requires exactly `Bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get("authorization")
        .ok_or("missing auth token")?
        .to_str()
        .map_err(|_| "invalid auth token format")?;

    let parts: Vec<&str> = auth_header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token.to_string()),
        _ => Err("invalid auth token format"),
    }
}
