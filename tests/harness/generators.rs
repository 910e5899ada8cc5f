// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A contact body that passes validation.
pub fn valid_contact(i: usize) -> Value {
    json!({
        "subject": format!("Project inquiry #{i}"),
        "message": "I saw your portfolio and would like to talk about a project.",
        "from": format!("visitor{i}@example.org"),
    })
}

/// A subscribe body that passes validation.
pub fn valid_subscribe(i: usize) -> Value {
    json!({ "email": format!("reader{i}@example.org") })
}

/// Bodies that must all fail validation.
pub fn invalid_payloads() -> Vec<Value> {
    vec![
        json!({}),
        json!(null),
        json!([]),
        json!("subject"),
        json!({ "subject": "Hello", "message": "A long enough message" }),
        json!({ "subject": "", "message": "A long enough message", "from": "a@b.com" }),
        json!({ "subject": 1, "message": 2, "from": 3 }),
        json!({ "subject": "Hello", "message": "A long enough message", "from": "a@b" }),
        json!({ "subject": "Hello", "message": "A long enough message", "from": "a b@c.com" }),
        json!({ "subject": "Hi", "message": "A long enough message", "from": "a@b.com" }),
        json!({ "subject": "Hello", "message": "short", "from": "a@b.com" }),
        json!({ "subject": "s".repeat(201), "message": "A long enough message", "from": "a@b.com" }),
        json!({ "subject": "Hello", "message": "m".repeat(5001), "from": "a@b.com" }),
        json!({ "subject": "Hello", "message": "A long enough message", "from": format!("{}@b.com", "a".repeat(200)) }),
    ]
}

/// Payload for request `i` of an attack.
pub fn payload(path: &str, valid: bool, i: usize) -> Value {
    if !valid {
        let pool = invalid_payloads();
        return pool[i % pool.len()].clone();
    }
    if path.ends_with("subscribe") {
        valid_subscribe(i)
    } else {
        valid_contact(i)
    }
}
