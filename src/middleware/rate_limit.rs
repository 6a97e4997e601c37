use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Admission control, consulted before routing on every request.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_id = client_id(&request);
    let (allowed, retry_after) = state.rate_limiter.allow(&client_id);

    if !allowed {
        warn!(
            client = %client_id,
            method = %request.method(),
            path = %request.uri().path(),
            "rate limit exceeded"
        );
        return Err(ApiError::too_many_requests(retry_after));
    }

    Ok(next.run(request).await)
}

const TRUE_CLIENT_IP: &str = "true-client-ip";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client IP address: a proxy-supplied header when present and parseable,
/// otherwise the peer address. The port is dropped so reconnects share a
/// window.
fn client_id(request: &Request) -> String {
    forwarded_ip(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `True-Client-IP`, then `X-Real-IP`, then the first `X-Forwarded-For` hop.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, TRUE_CLIENT_IP)
        .or_else(|| header_str(headers, X_REAL_IP))
        .or_else(|| header_str(headers, X_FORWARDED_FOR).and_then(|v| v.split(',').next()))
        .and_then(|v| v.trim().parse().ok())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
