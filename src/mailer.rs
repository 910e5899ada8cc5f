// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound mail dispatch through an authenticated SMTP relay.
//!
//! The transport is built once from [`MailConfig`] and reused for every
//! message. Without credentials the mailer still starts, but every send
//! reports [`DispatchError::ConfigurationMissing`] so operators see the
//! problem on the first submission instead of a crash loop.

use crate::config::{ConfigError, MailConfig};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// SMTP replies meaning the relay refused our credentials.
const AUTH_REJECTED_CODES: &[&str] = &["530", "534", "535"];

/// A fully resolved outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Sender mailbox, e.g. `Portfolio Contact <me@example.com>`
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML alternative
    pub html: String,
}

/// Why a message was not delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Mail relay credentials are not configured")]
    ConfigurationMissing,

    #[error("Mail relay rejected credentials (SMTP {code})")]
    AuthenticationFailed { code: String },

    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Something that can deliver a [`MailMessage`].
pub trait MailTransport: Send + Sync + 'static {
    /// Attempt delivery once. No retries.
    fn send(&self, message: MailMessage) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Mail transport backed by an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    timeout: Duration,
}

impl SmtpMailer {
    /// Build the relay transport from configuration.
    ///
    /// Missing credentials produce an unconfigured mailer, not an error.
    pub fn new(config: &MailConfig) -> Result<Self, ConfigError> {
        let timeout = config.timeout();

        let Some((user, password)) = config.credentials() else {
            warn!(
                host = %config.host,
                "EMAIL_USER or EMAIL_PASS not set, mail dispatch disabled"
            );
            return Ok(Self {
                transport: None,
                timeout,
            });
        };

        let tls_parameters =
            TlsParameters::new(config.host.clone()).map_err(|err| ConfigError::Tls {
                host: config.host.clone(),
                reason: err.to_string(),
            })?;
        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .timeout(Some(timeout))
            .build();

        info!(
            host = %config.host,
            port = config.port,
            secure = config.secure,
            "Mail relay configured"
        );

        Ok(Self {
            transport: Some(transport),
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Open a connection to the relay and authenticate, without sending.
    pub async fn verify(&self) -> Result<(), DispatchError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(DispatchError::ConfigurationMissing)?;

        match tokio::time::timeout(self.timeout, transport.test_connection()).await {
            Err(_) => Err(DispatchError::Delivery("connection check timed out".to_string())),
            Ok(Err(err)) => Err(classify(&err)),
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(DispatchError::Delivery(
                "relay did not accept the connection".to_string(),
            )),
        }
    }
}

impl MailTransport for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), DispatchError> {
        let Some(transport) = &self.transport else {
            warn!("Mail dispatch attempted without relay credentials");
            return Err(DispatchError::ConfigurationMissing);
        };

        let email = build_message(&message)?;

        match tokio::time::timeout(self.timeout, transport.send(email)).await {
            Err(_) => Err(DispatchError::Delivery(format!(
                "relay did not answer within {:?}",
                self.timeout
            ))),
            Ok(Err(err)) => Err(classify(&err)),
            Ok(Ok(response)) if response.is_positive() => {
                debug!(code = %response.code(), "Relay accepted message");
                Ok(())
            }
            Ok(Ok(response)) => Err(DispatchError::Delivery(format!(
                "relay answered {}",
                response.code()
            ))),
        }
    }
}

fn build_message(message: &MailMessage) -> Result<Message, DispatchError> {
    let mut builder = Message::builder()
        .from(parse_mailbox("sender", &message.from)?)
        .to(parse_mailbox("recipient", &message.to)?)
        .subject(message.subject.clone());

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(parse_mailbox("reply-to", reply_to)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            message.html.clone(),
        ))
        .map_err(|err| DispatchError::Delivery(format!("cannot build message: {err}")))
}

fn parse_mailbox(role: &str, raw: &str) -> Result<Mailbox, DispatchError> {
    raw.parse()
        .map_err(|err| DispatchError::Delivery(format!("invalid {role} address: {err}")))
}

/// Map a relay error onto the dispatch taxonomy.
fn classify(err: &lettre::transport::smtp::Error) -> DispatchError {
    classify_reply(err.status().map(|code| code.to_string()), || err.to_string())
}

fn classify_reply(code: Option<String>, detail: impl FnOnce() -> String) -> DispatchError {
    match code {
        Some(code) if AUTH_REJECTED_CODES.contains(&code.as_str()) => {
            DispatchError::AuthenticationFailed { code }
        }
        _ => DispatchError::Delivery(detail()),
    }
}
