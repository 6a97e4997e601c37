use std::any::Any;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::config::{ServerConfig, REQUEST_TIMEOUT};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{
    auth_token_middleware, rate_limit_middleware, transaction_context_middleware,
    transaction_ownership_middleware,
};
use crate::state::AppState;

/// Builds the full `/api/v1` application.
///
/// Outer layers, first to last: request id, tracing, panic recovery, CORS.
/// Per request: rate limiter (when enabled), then for protected routes the
/// bearer token and principal, then for `/transactions/:id` the transaction
/// context and the ownership check, then the handler.
pub fn build_router(state: AppState) -> Router {
    let api = public_routes().merge(protected_routes(state.clone()));

    let mut router = Router::new()
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    if state.config.rate_limiter.enabled {
        router = router.layer(from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router
        .layer(cors_layer(&state.config.server))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!(panic = detail, "handler panicked");
    ApiError::internal().into_response()
}

fn public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/health", get(public::health_get))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/validate-invitation-token/:token", get(auth::validate_invitation_get))
        .route("/auth/forgot-password", post(auth::forgot_password_post))
        .route("/auth/validate-reset-token/:token", get(auth::validate_reset_token_get))
        .route("/auth/reset-password", put(auth::reset_password_put))
        .route("/users/activate/:token", put(public::activate_put))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::transactions;

    // Layers run bottom-up: context loads the row, then ownership checks it.
    let transaction_record = Router::new()
        .route(
            "/transactions/:id",
            get(transactions::transaction_get)
                .patch(transactions::transaction_patch)
                .delete(transactions::transaction_delete),
        )
        .route_layer(from_fn(transaction_ownership_middleware))
        .route_layer(from_fn_with_state(state.clone(), transaction_context_middleware));

    Router::new()
        .route("/users/token", get(protected::token_user_get))
        .route("/categories", get(protected::categories_get))
        .route(
            "/transactions",
            post(transactions::transactions_post).get(transactions::transactions_get),
        )
        .merge(transaction_record)
        .route_layer(from_fn_with_state(state, auth_token_middleware))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK, header::RETRY_AFTER])
        .allow_credentials(false)
        .max_age(Duration::from_secs(300));

    match HeaderValue::from_str(&config.cors_allowed_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(origin = %config.cors_allowed_origin, "invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}
