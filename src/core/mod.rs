// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Core engine module - drives scanning and reporting

mod engine;

pub use engine::Engine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running counters of the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub scans: u64,
    pub published: u64,
    pub failed_publishes: u64,
    pub last_scan: Option<DateTime<Utc>>,
}
