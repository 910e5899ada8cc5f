// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns against the form endpoints.

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of unique client IPs to simulate
    pub unique_ips: usize,
    /// Endpoint path under attack
    pub path: &'static str,
    /// Whether request bodies pass validation
    pub valid_payloads: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 1,
            path: "/api/contact",
            valid_payloads: true,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single IP flood: one client hammering the contact form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 60,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Distributed spam: many clients, each staying under the limit.
    pub fn distributed_spam() -> Self {
        Self {
            total_requests: 300,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Junk payloads from a handful of clients.
    pub fn junk_payloads() -> Self {
        Self {
            total_requests: 40,
            unique_ips: 20,
            valid_payloads: false,
            ..Default::default()
        }
    }

    /// Subscription bombing: one client signing up addresses repeatedly.
    pub fn subscription_bombing() -> Self {
        Self {
            total_requests: 30,
            unique_ips: 1,
            path: "/api/subscribe",
            ..Default::default()
        }
    }

    /// Requests each simulated client sends.
    pub fn requests_per_ip(&self) -> usize {
        self.total_requests.div_ceil(self.unique_ips)
    }
}
