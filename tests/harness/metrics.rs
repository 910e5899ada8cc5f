// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome collection for abuse simulation results.

use axum::http::StatusCode;
use std::collections::HashMap;
use std::time::Duration;

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Delivered,
    RateLimited,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => Self::Delivered,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::BAD_REQUEST => Self::Rejected,
            _ => Self::Failed,
        }
    }
}

/// Collects outcomes during an attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    outcomes: HashMap<Outcome, usize>,
    requests_per_ip: HashMap<String, usize>,
    latencies: Vec<Duration>,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        self.latencies.push(latency);
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Ratio of requests that did not get delivered.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Delivered)) as f64 / total as f64
    }

    pub fn median_latency(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }
}

impl std::fmt::Display for AttackMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Abuse Simulation Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests())?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips())?;
        writeln!(f, "Delivered:         {}", self.count(Outcome::Delivered))?;
        writeln!(f, "Rate Limited:      {}", self.count(Outcome::RateLimited))?;
        writeln!(f, "Rejected:          {}", self.count(Outcome::Rejected))?;
        writeln!(f, "Failed:            {}", self.count(Outcome::Failed))?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate() * 100.0)?;
        writeln!(f, "Median Latency:    {:?}", self.median_latency())?;
        Ok(())
    }
}
