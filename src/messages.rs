// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Composition of the outgoing messages for each endpoint.

use crate::config::MailConfig;
use crate::mailer::MailMessage;
use crate::validator::{ContactSubmission, SubscribeSubmission};
use chrono::{DateTime, Utc};

/// Who the site's mail comes from and where contact messages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailIdentity {
    pub from_name: String,
    /// Sender address (the relay account)
    pub sender: String,
    /// Owner inbox for contact messages
    pub recipient: String,
}

impl MailIdentity {
    /// Resolve the identity from configuration. `None` without `EMAIL_USER`.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        let sender = config.user.clone()?;
        let recipient = config.recipient().unwrap_or(&sender).to_string();

        Some(Self {
            from_name: config.from_name.clone(),
            sender,
            recipient,
        })
    }

    fn mailbox(&self) -> String {
        let name = single_line(&self.from_name).replace(['"', '\\'], "");
        format!("\"{}\" <{}>", name, self.sender)
    }
}

/// Message forwarding a contact submission to the site owner.
pub fn contact_message(
    identity: &MailIdentity,
    submission: &ContactSubmission,
    received_at: DateTime<Utc>,
) -> MailMessage {
    let subject = single_line(&submission.subject);
    let received = received_at.to_rfc2822();

    let text = format!(
        "New message from your portfolio contact form.\n\n\
         From: {from}\n\
         Subject: {subject}\n\
         Received: {received}\n\n\
         {message}\n",
        from = submission.from,
        message = submission.message,
    );

    let html = format!(
        "<h2>New message from your portfolio contact form</h2>\n\
         <p><strong>From:</strong> {from}<br>\n\
         <strong>Subject:</strong> {subject}<br>\n\
         <strong>Received:</strong> {received}</p>\n\
         <p>{message}</p>\n",
        from = escape_html(&submission.from),
        subject = escape_html(&subject),
        message = escape_html(&submission.message).replace('\n', "<br>\n"),
    );

    MailMessage {
        from: identity.mailbox(),
        to: identity.recipient.clone(),
        reply_to: Some(submission.from.clone()),
        subject: format!("Portfolio contact: {subject}"),
        text,
        html,
    }
}

/// Fixed "thanks for connecting" reply to a subscriber.
pub fn subscribe_message(identity: &MailIdentity, submission: &SubscribeSubmission) -> MailMessage {
    let name = single_line(&identity.from_name);

    let text = format!(
        "Hi,\n\n\
         Thanks for connecting! Your address was added to my list and I will \
         reach out when I have something new to share.\n\n\
         If this wasn't you, just ignore this email.\n\n\
         {name}\n"
    );

    let html = format!(
        "<p>Hi,</p>\n\
         <p>Thanks for connecting! Your address was added to my list and I will \
         reach out when I have something new to share.</p>\n\
         <p>If this wasn't you, just ignore this email.</p>\n\
         <p>{}</p>\n",
        escape_html(&name)
    );

    MailMessage {
        from: identity.mailbox(),
        to: submission.email.clone(),
        reply_to: Some(identity.recipient.clone()),
        subject: "Thanks for connecting!".to_string(),
        text,
        html,
    }
}

/// Collapse control characters so the value is safe in a header line.
fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
