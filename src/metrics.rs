// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for submissions and mail dispatch.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters and timings owned by the application state.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    dispatch_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("contact_relay".to_string()), None)?;

        let submissions = IntCounterVec::new(
            Opts::new("submissions_total", "Form submissions by endpoint and outcome"),
            &["endpoint", "outcome"],
        )?;
        let dispatch_seconds = HistogramVec::new(
            HistogramOpts::new("dispatch_seconds", "Time spent handing mail to the relay")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["endpoint"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(dispatch_seconds.clone()))?;

        Ok(Self {
            registry,
            submissions,
            dispatch_seconds,
        })
    }

    /// Count one finished submission.
    pub fn record_outcome(&self, endpoint: &str, outcome: &str) {
        self.submissions.with_label_values(&[endpoint, outcome]).inc();
    }

    pub fn observe_dispatch(&self, endpoint: &str, seconds: f64) {
        self.dispatch_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    pub fn submissions(&self, endpoint: &str, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[endpoint, outcome]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
