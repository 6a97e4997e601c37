use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fintrack_api::app::build_router;
use fintrack_api::auth::JwtAuthenticator;
use fintrack_api::config;
use fintrack_api::database::{DatabaseManager, Storage};
use fintrack_api::mail::{LogMailer, Mailer, MailtrapMailer};
use fintrack_api::ratelimiter::{spawn_purge_task, FixedWindowRateLimiter, RateLimiter};
use fintrack_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DB_ADDR, AUTH_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fintrack_api=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::config().clone();
    info!(
        env = config.environment.as_str(),
        addr = %config.server.addr,
        rate_limiter = config.rate_limiter.enabled,
        "starting fintrack api"
    );

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let authenticator = Arc::new(
        JwtAuthenticator::new(&config.auth.token_secret, &config.auth.issuer, &config.auth.issuer)
            .context("invalid token configuration")?,
    );

    let mailer: Arc<dyn Mailer> = if config.mail.api_key.is_empty() {
        warn!("MAILTRAP_API_KEY not set, outgoing mail will only be logged");
        Arc::new(LogMailer)
    } else {
        Arc::new(MailtrapMailer::new(config.mail.api_key.clone(), config.mail.from_email.clone())?)
    };

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowRateLimiter::new(
        config.rate_limiter.requests_per_window,
        config.rate_limiter.window,
    ));
    let purge_task = spawn_purge_task(rate_limiter.clone(), config.rate_limiter.window);

    let state = AppState::new(
        config.clone(),
        Storage::postgres(database.clone()),
        authenticator,
        mailer,
        rate_limiter,
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!("server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    database.close().await;
    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
