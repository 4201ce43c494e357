// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::JobConfig;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::build::BuildStatus;
    use proptest::prelude::*;

    pub fn arb_build_status() -> impl Strategy<Value = BuildStatus> {
        prop_oneof![
            Just(BuildStatus::Pending),
            Just(BuildStatus::Running),
            Just(BuildStatus::Complete),
            Just(BuildStatus::Failed),
        ]
    }
}

// ── Record factories ────────────────────────────────────────────────────

/// Job configuration `{"name": <name>}`.
pub fn named_config(name: &str) -> JobConfig {
    let mut map = serde_json::Map::new();
    map.insert("name".to_string(), serde_json::Value::String(name.to_string()));
    JobConfig::from_value(serde_json::Value::Object(map)).unwrap_or_default()
}
