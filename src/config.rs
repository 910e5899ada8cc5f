// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Everything is read from environment variables (optionally seeded from a
//! `.env` file by the binary). Missing mail credentials are not an error here:
//! the mailer starts unconfigured and reports it per request. Malformed values
//! are rejected at startup.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Cannot set up TLS for SMTP host {host}: {reason}")]
    Tls { host: String, reason: String },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Submission validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Outbound mail relay
    #[serde(default)]
    pub mail: MailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Browser origin allowed to call the API cross-origin
    #[serde(default)]
    pub cors_allow_origin: Option<String>,
}

/// Sliding-window rate limiting, applied per client and per endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window (default: 6)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often idle keys are swept, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Length limits for submitted fields. Lengths count characters.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_subject_min_len")]
    pub subject_min_len: usize,
    #[serde(default = "default_subject_max_len")]
    pub subject_max_len: usize,
    #[serde(default = "default_message_min_len")]
    pub message_min_len: usize,
    #[serde(default = "default_message_max_len")]
    pub message_max_len: usize,
    /// Maximum length of the contact form's `from` address (default: 200)
    #[serde(default = "default_contact_email_max_len")]
    pub contact_email_max_len: usize,
    /// Maximum length of the subscribe form's `email` (default: 100)
    #[serde(default = "default_subscribe_email_max_len")]
    pub subscribe_email_max_len: usize,
}

/// SMTP relay settings.
#[derive(Clone, Deserialize)]
pub struct MailConfig {
    /// Relay username, also used as the sender address
    #[serde(default)]
    pub user: Option<String>,

    /// Relay password
    #[serde(default)]
    pub password: Option<String>,

    /// Destination for contact messages (default: `user`)
    #[serde(default)]
    pub to: Option<String>,

    /// Display name on outgoing mail
    #[serde(default = "default_from_name")]
    pub from_name: String,

    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Implicit TLS. When false, STARTTLS is used if the relay offers it.
    #[serde(default = "default_true")]
    pub secure: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    6
}

fn default_window_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_subject_min_len() -> usize {
    3
}

fn default_subject_max_len() -> usize {
    200
}

fn default_message_min_len() -> usize {
    10
}

fn default_message_max_len() -> usize {
    5000
}

fn default_contact_email_max_len() -> usize {
    200
}

fn default_subscribe_email_max_len() -> usize {
    100
}

fn default_from_name() -> String {
    "Portfolio Contact".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            metrics: MetricsConfig::default(),
            cors_allow_origin: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            subject_min_len: default_subject_min_len(),
            subject_max_len: default_subject_max_len(),
            message_min_len: default_message_min_len(),
            message_max_len: default_message_max_len(),
            contact_email_max_len: default_contact_email_max_len(),
            subscribe_email_max_len: default_subscribe_email_max_len(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            to: None,
            from_name: default_from_name(),
            host: default_smtp_host(),
            port: default_smtp_port(),
            secure: default_true(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

// The password never reaches logs.
impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("to", &self.to)
            .field("from_name", &self.from_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl MailConfig {
    /// Username and password, if both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }

    /// Where contact messages go: `to`, falling back to `user`.
    pub fn recipient(&self) -> Option<&str> {
        self.to.as_deref().or(self.user.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let port = parse_var(&get, "SMTP_PORT")?.unwrap_or(defaults.mail.port);
        let secure = match get("SMTP_SECURE") {
            Some(raw) => parse_bool("SMTP_SECURE", &raw)?,
            None => port == 465,
        };

        let mail = MailConfig {
            user: get("EMAIL_USER"),
            password: get("EMAIL_PASS"),
            to: get("EMAIL_TO"),
            from_name: get("EMAIL_FROM_NAME").unwrap_or(defaults.mail.from_name),
            host: get("SMTP_HOST").unwrap_or(defaults.mail.host),
            port,
            secure,
            timeout_secs: parse_var(&get, "SMTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.mail.timeout_secs),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_var(&get, "RATE_LIMIT_MAX")?
                .unwrap_or(defaults.rate_limit.max_requests),
            window_secs: parse_var(&get, "RATE_LIMIT_WINDOW_SECS")?
                .unwrap_or(defaults.rate_limit.window_secs),
            ..defaults.rate_limit
        };

        let metrics = MetricsConfig {
            enabled: match get("METRICS_ENABLED") {
                Some(raw) => parse_bool("METRICS_ENABLED", &raw)?,
                None => defaults.metrics.enabled,
            },
            ..defaults.metrics
        };

        Ok(Config {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit,
            validation: defaults.validation,
            mail,
            metrics,
            cors_allow_origin: get("CORS_ALLOW_ORIGIN"),
        })
    }
}

fn parse_var<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
            })
        })
        .transpose()
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
