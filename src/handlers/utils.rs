// handlers/utils.rs - request body parsing and payload validation helpers

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::warn;

use crate::auth::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::ApiError;

pub const MAX_USERNAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Unwraps a JSON body, turning extractor rejections into the API error shape.
pub fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!("failed to read request body: {}", rejection.body_text());
            Err(ApiError::invalid_json(rejection.body_text()))
        }
    }
}

/// Collects per-field validation failures.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(msg) = result {
            self.0.insert(field.to_string(), msg);
        }
    }

    pub fn add(&mut self, field: &str, msg: impl Into<String>) {
        self.0.insert(field.to_string(), msg.into());
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            warn!(fields = ?self.0.keys().collect::<Vec<_>>(), "request payload failed validation");
            Err(ApiError::validation_error("invalid request payload", Some(self.0)))
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("username is required".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!("username must be at most {} characters", MAX_USERNAME_LENGTH));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("email is required".to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(format!("email must be at most {} characters", MAX_EMAIL_LENGTH));
    }
    if !looks_like_email(email) {
        return Err("email must be a valid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("password is required".to_string());
    }
    let len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return Err(format!(
            "password must be between {} and {} characters",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

// local@domain.tld, no whitespace, one '@', dotted domain
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
