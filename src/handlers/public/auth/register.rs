// handlers/public/auth/register.rs - POST /api/v1/auth/register

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::password::hash_password;
use crate::auth::token::OneTimeToken;
use crate::database::models::{NewUser, User, DEFAULT_ROLE};
use crate::handlers::utils::{read_json, validate_email, validate_password, validate_username, FieldErrors};
use crate::mail::MailTemplate;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterUserPayload {
    fn validate(&self) -> Result<(), crate::error::ApiError> {
        let mut errors = FieldErrors::new();
        errors.check("username", validate_username(&self.username));
        errors.check("email", validate_email(&self.email));
        errors.check("password", validate_password(&self.password));
        errors.into_result()
    }
}

/// The created user plus the plain activation token.
#[derive(Debug, Serialize)]
pub struct UserWithToken {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

/// Creates an inactive user with a pending invitation and mails the
/// activation link. If the mail cannot be sent the user is removed again and
/// the request fails.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserPayload>, JsonRejection>,
) -> ApiResult<UserWithToken> {
    let payload = read_json(payload)?;
    payload.validate()?;

    let password_hash = hash_password(&payload.password)?;
    let token = OneTimeToken::generate();

    let user = state
        .store
        .users
        .create_and_invite(
            NewUser {
                username: payload.username,
                email: payload.email,
                password_hash,
                role_name: DEFAULT_ROLE.to_string(),
            },
            &token.hash,
            state.config.mail.invitation_exp,
        )
        .await?;

    let template = MailTemplate::UserInvitation {
        username: user.username.clone(),
        activation_url: format!("{}/users/activate/{}", state.config.server.frontend_url, token.plain),
    };

    match state
        .mailer
        .send(&template, &user.username, &user.email, state.mail_sandboxed())
        .await
    {
        Ok(status) => info!(status, "invitation email sent"),
        Err(e) => {
            error!(user_id = user.id, error = %e, "error sending invitation email, rolling back user");
            if let Err(delete_err) = state.store.users.delete(user.id).await {
                error!(user_id = user.id, error = %delete_err, "error deleting user");
            }
            return Err(e.into());
        }
    }

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(ApiResponse::created(UserWithToken { user, token: token.plain }))
}
