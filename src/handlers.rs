// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay.
//!
//! Both form endpoints run the same pipeline: rate limit, parse, validate,
//! compose, dispatch. Each step can end the request early; nothing loops back.

use crate::config::Config;
use crate::error::{handle_panic, ApiError, SuccessResponse};
use crate::limiter::{RateLimitPolicy, RateLimitResult, RateLimiter};
use crate::mailer::{DispatchError, MailMessage, MailTransport};
use crate::messages::{contact_message, subscribe_message, MailIdentity};
use crate::metrics::Metrics;
use crate::validator::{SubmissionValidator, ValidationError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Client key used when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared application state.
pub struct AppState<M> {
    pub limiter: RateLimiter,
    pub policy: RateLimitPolicy,
    pub validator: SubmissionValidator,
    pub mailer: M,
    pub identity: Option<MailIdentity>,
    pub metrics: Metrics,
}

impl<M: MailTransport> AppState<M> {
    pub fn new(config: &Config, limiter: RateLimiter, mailer: M) -> prometheus::Result<Self> {
        Ok(Self {
            limiter,
            policy: RateLimitPolicy::from(&config.rate_limit),
            validator: SubmissionValidator::new(config.validation.clone()),
            mailer,
            identity: MailIdentity::from_config(&config.mail),
            metrics: Metrics::new()?,
        })
    }
}

/// The two form endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Contact,
    Subscribe,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Subscribe => "subscribe",
        }
    }

    /// Rate limit key, scoped so each endpoint has its own budget.
    fn limit_key(self, client: &str) -> String {
        format!("{}:{}", self.as_str(), client)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the application router.
pub fn router<M: MailTransport>(state: Arc<AppState<M>>, config: &Config) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/contact", post(contact::<M>))
        .route("/api/subscribe", post(subscribe::<M>));

    if config.metrics.enabled {
        app = app.route(&config.metrics.path, get(metrics::<M>));
    }

    if let Some(origin) = &config.cors_allow_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods([Method::POST])
                        .allow_headers([header::CONTENT_TYPE]),
                );
            }
            Err(_) => warn!(origin = %origin, "Ignoring unparseable CORS origin"),
        }
    }

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics<M: MailTransport>(State(state): State<Arc<AppState<M>>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            ApiError::Internal.into_response()
        }
    }
}

/// `POST /api/contact`: forward a message to the site owner.
pub async fn contact<M: MailTransport>(
    State(state): State<Arc<AppState<M>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let client = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let result = submit(&state, Endpoint::Contact, &client, body).await;
    respond(&state, Endpoint::Contact, &client, result)
}

/// `POST /api/subscribe`: send the subscriber a thank-you note.
pub async fn subscribe<M: MailTransport>(
    State(state): State<Arc<AppState<M>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let client = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let result = submit(&state, Endpoint::Subscribe, &client, body).await;
    respond(&state, Endpoint::Subscribe, &client, result)
}

/// Identify the client: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header_value("x-forwarded-for")
        .or_else(|| header_value("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

async fn submit<M: MailTransport>(
    state: &AppState<M>,
    endpoint: Endpoint,
    client: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<(), ApiError> {
    let key = endpoint.limit_key(client);
    if let RateLimitResult::Limited { retry_after } = state.limiter.check(&key, state.policy) {
        return Err(ApiError::RateLimited { retry_after });
    }

    let body = body.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable request body");
        ValidationError::InvalidBody
    })?;
    let value: Value = serde_json::from_slice(&body).map_err(|err| {
        debug!(error = %err, "Request body is not JSON");
        ValidationError::InvalidBody
    })?;

    let message = compose(state, endpoint, &value)?;

    let started = Instant::now();
    let sent = state.mailer.send(message).await;
    state
        .metrics
        .observe_dispatch(endpoint.as_str(), started.elapsed().as_secs_f64());

    sent.map_err(ApiError::from)
}

fn compose<M>(
    state: &AppState<M>,
    endpoint: Endpoint,
    body: &Value,
) -> Result<MailMessage, ApiError> {
    let message = match endpoint {
        Endpoint::Contact => {
            let submission = state.validator.validate_contact(body)?;
            let identity = state
                .identity
                .as_ref()
                .ok_or(DispatchError::ConfigurationMissing)?;
            contact_message(identity, &submission, Utc::now())
        }
        Endpoint::Subscribe => {
            let submission = state.validator.validate_subscribe(body)?;
            let identity = state
                .identity
                .as_ref()
                .ok_or(DispatchError::ConfigurationMissing)?;
            subscribe_message(identity, &submission)
        }
    };
    Ok(message)
}

fn respond<M>(
    state: &AppState<M>,
    endpoint: Endpoint,
    client: &str,
    result: Result<(), ApiError>,
) -> Response {
    let name = endpoint.as_str();

    match result {
        Ok(()) => {
            state.metrics.record_outcome(name, "sent");
            info!(endpoint = name, client, "Submission delivered");
            Json(SuccessResponse { success: true }).into_response()
        }
        Err(err) => {
            state.metrics.record_outcome(name, err.outcome());
            let status = err.status().as_u16();
            match &err {
                ApiError::RateLimited { retry_after } => {
                    info!(
                        endpoint = name,
                        client,
                        status,
                        retry_after_secs = retry_after.as_secs(),
                        "Submission rate limited"
                    );
                }
                ApiError::Invalid(reason) => {
                    info!(endpoint = name, client, status, reason = %reason, "Submission rejected");
                }
                ApiError::Dispatch(DispatchError::AuthenticationFailed { code }) => {
                    error!(
                        endpoint = name,
                        status,
                        smtp_code = %code,
                        "Mail relay rejected credentials, check EMAIL_USER and EMAIL_PASS"
                    );
                }
                ApiError::Dispatch(DispatchError::ConfigurationMissing) => {
                    error!(endpoint = name, status, "Mail relay is not configured");
                }
                ApiError::Dispatch(DispatchError::Delivery(detail)) => {
                    error!(endpoint = name, status, detail = %detail, "Mail delivery failed");
                }
                ApiError::Internal => {
                    error!(endpoint = name, status, "Internal error");
                }
            }
            err.into_response()
        }
    }
}
