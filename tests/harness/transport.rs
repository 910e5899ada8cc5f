// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-process mail transports for handler tests.

use contact_relay::mailer::{DispatchError, MailMessage, MailTransport};
use std::sync::{Arc, Mutex};

/// Records every message and answers with a fixed outcome.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    failure: Option<DispatchError>,
}

impl RecordingTransport {
    /// A transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that records, then fails with `failure`.
    pub fn failing(failure: DispatchError) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(failure),
        }
    }

    /// Messages handed to the transport so far.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MailTransport for RecordingTransport {
    async fn send(&self, message: MailMessage) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(message);
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

/// Panics on send, standing in for a bug inside the pipeline.
#[derive(Clone, Copy, Default)]
pub struct PanickingTransport;

impl MailTransport for PanickingTransport {
    async fn send(&self, _message: MailMessage) -> Result<(), DispatchError> {
        panic!("relay credentials: owner@example.com / app-password");
    }
}
