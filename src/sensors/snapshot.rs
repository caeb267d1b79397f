// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Status snapshot handed to the reporting side

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slot::SlotStatus;

/// Unit of every value this module publishes
pub const UNITS: &str = "lux";

/// Module status, refreshed by the manager and read by reporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub value_units: String,
    /// Latest valid value per subID
    pub values: BTreeMap<String, f32>,
    pub cooldown_secs: u64,
    pub sensors: Vec<SlotStatus>,
    pub updated: Option<DateTime<Utc>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            value_units: UNITS.to_string(),
            values: BTreeMap::new(),
            cooldown_secs: 0,
            sensors: Vec::new(),
            updated: None,
        }
    }
}
