// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the contact relay.
//!
//! Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod metrics;
pub mod transport;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use contact_relay::{
    config::{Config, MailConfig, RateLimitConfig},
    handlers::{router, AppState},
    limiter::RateLimiter,
    mailer::MailTransport,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Configuration with relay credentials and the given rate limit.
pub fn configured(max_requests: u32) -> Config {
    Config {
        rate_limit: RateLimitConfig {
            max_requests,
            window_secs: 60,
            ..Default::default()
        },
        mail: MailConfig {
            user: Some("owner@example.com".to_string()),
            password: Some("app-password".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build the router around `mailer`, returning the state for inspection.
pub fn build_app<M: MailTransport>(config: &Config, mailer: M) -> (Router, Arc<AppState<M>>) {
    let state = Arc::new(AppState::new(config, RateLimiter::new(), mailer).unwrap());
    (router(state.clone(), config), state)
}

/// A JSON POST as forwarded by a proxy for `client_ip`.
pub fn post_json(path: &str, body: &Value, client_ip: &str) -> Request<Body> {
    post_raw(path, body.to_string(), client_ip)
}

pub fn post_raw(path: &str, body: impl Into<Body>, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client_ip)
        .body(body.into())
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

/// Response pieces a test usually asserts on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Run one request through the router.
pub async fn call(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}
