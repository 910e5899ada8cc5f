// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! The mail backend behind a portfolio site's contact and subscribe forms:
//!
//! - Per-client sliding-window rate limiting, separately per endpoint
//! - Validation of submitted fields (presence, types, lengths, email shape)
//! - Transactional email through an authenticated SMTP relay
//! - Failure mapping that keeps relay details out of client responses

pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod messages;
pub mod metrics;
pub mod validator;

pub use config::Config;
pub use error::ApiError;
pub use handlers::{router, AppState};
pub use limiter::{RateLimitPolicy, RateLimitResult, RateLimiter};
pub use mailer::{DispatchError, MailMessage, MailTransport, SmtpMailer};
pub use validator::{SubmissionValidator, ValidationError};
