// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP-facing error type.
//!
//! Maps each failure class onto a status code and a client-safe message.
//! Details (SMTP codes, relay text) stay in the server logs.

use crate::mailer::DispatchError;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Success response body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Everything a submission can end in, other than success.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Dispatch(DispatchError::AuthenticationFailed { .. }) => StatusCode::BAD_GATEWAY,
            Self::Dispatch(DispatchError::ConfigurationMissing | DispatchError::Delivery(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    pub fn client_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "Too many requests".to_string(),
            Self::Invalid(err) => err.to_string(),
            Self::Dispatch(DispatchError::AuthenticationFailed { .. }) => {
                "Email authentication failed. Please contact the site owner.".to_string()
            }
            Self::Dispatch(DispatchError::ConfigurationMissing) => {
                "Email service not configured".to_string()
            }
            Self::Dispatch(DispatchError::Delivery(_)) => "Failed to send email".to_string(),
            Self::Internal => "Internal server error".to_string(),
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Invalid(_) => "invalid",
            Self::Dispatch(DispatchError::AuthenticationFailed { .. }) => "auth_failed",
            Self::Dispatch(DispatchError::ConfigurationMissing) => "not_configured",
            Self::Dispatch(DispatchError::Delivery(_)) => "delivery_failed",
            Self::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.client_message(),
        });

        match self {
            Self::RateLimited { retry_after } => {
                // Round up so clients never retry early
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.max(1).to_string())],
                    body,
                )
                    .into_response()
            }
            other => (other.status(), body).into_response(),
        }
    }
}

/// Response for a handler panic, used with `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    error!(detail, "Request handler panicked");

    ApiError::Internal.into_response()
}
