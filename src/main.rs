// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact and subscribe submissions from a portfolio site and relays
//! them as email through an authenticated SMTP server.
//!
//! ## Endpoints
//!
//! - `POST /api/contact`: `{subject, message, from}`, forwarded to the owner
//! - `POST /api/subscribe`: `{email}`, answered with a thank-you note
//! - `GET /health`, `GET /healthz`
//! - `GET /metrics` (Prometheus, unless `METRICS_ENABLED=false`)
//!
//! ## Configuration
//!
//! Read from environment variables, after loading `.env` if present:
//!
//! - `EMAIL_USER`, `EMAIL_PASS`: relay credentials (sender address)
//! - `EMAIL_TO`: owner inbox (default: `EMAIL_USER`)
//! - `SMTP_HOST` (default: smtp.gmail.com), `SMTP_PORT` (default: 465)
//! - `SMTP_SECURE`: implicit TLS (default: true iff port is 465)
//! - `RATE_LIMIT_MAX` (default: 6), `RATE_LIMIT_WINDOW_SECS` (default: 60)
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    mailer::SmtpMailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Failed to load .env file"),
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        smtp_host = %config.mail.host,
        smtp_port = config.mail.port,
        smtp_secure = config.mail.secure,
        "Starting contact relay"
    );

    let mailer = SmtpMailer::new(&config.mail)?;
    if mailer.is_configured() {
        let probe = mailer.clone();
        tokio::spawn(async move {
            match probe.verify().await {
                Ok(()) => info!("Mail relay connection verified"),
                Err(err) => warn!(error = %err, "Mail relay check failed"),
            }
        });
    }

    let limiter = RateLimiter::new();
    let state = Arc::new(AppState::new(&config, limiter.clone(), mailer)?);

    // Spawn cleanup task
    let idle = config.rate_limit.window_duration();
    let mut interval = tokio::time::interval(config.rate_limit.cleanup_interval());
    tokio::spawn(async move {
        loop {
            interval.tick().await;
            limiter.cleanup(idle);
        }
    });

    let app = router(state, &config);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
