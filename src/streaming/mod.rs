// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Streaming module - publishing values and status, receiving orders

mod commands;
mod mqtt;

pub use commands::{Order, OrderError};
pub use mqtt::MqttReporter;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sensors::{StatusSnapshot, UNITS};

/// Name of the module in topics
pub const MODULE_NAME: &str = "luminosity";

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Enable MQTT
    pub mqtt_enabled: bool,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub keep_alive_secs: u64,

    /// Topics are `<base_topic>/luminosity` and `<base_topic>/luminosity/command`
    pub base_topic: String,

    /// Republish an unchanged value once it is this old
    pub resend_max_age_secs: u64,

    /// Gap between two consecutive publications
    pub publish_gap_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            mqtt_enabled: false,
            mqtt_broker: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "lumisense".to_string(),
            mqtt_username: None,
            mqtt_password: None,
            keep_alive_secs: 30,
            base_topic: "lumisense".to_string(),
            resend_max_age_secs: 900,
            publish_gap_ms: 20,
        }
    }
}

impl StreamingConfig {
    pub fn publish_topic(&self) -> String {
        format!("{}/{}", self.base_topic, MODULE_NAME)
    }

    pub fn command_topic(&self) -> String {
        format!("{}/command", self.publish_topic())
    }
}

/// One published value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMessage {
    pub value: i64,
    pub value_units: String,
    #[serde(rename = "subID")]
    pub sub_id: String,
}

impl ValueMessage {
    /// Lux message for one sensor. The value is rounded to the nearest
    /// integer, matching the rounded comparison behind slot triggers.
    pub fn lux(value: f32, sub_id: String) -> Self {
        Self {
            value: value.round() as i64,
            value_units: UNITS.to_string(),
            sub_id,
        }
    }
}

/// Outbound side of the module
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn publish_value(&self, message: &ValueMessage) -> Result<()>;

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<()>;

    /// Release the connection at shutdown
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Reporter that only logs, used when MQTT is disabled
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    async fn publish_value(&self, message: &ValueMessage) -> Result<()> {
        info!("[{}] {} {}", message.sub_id, message.value, message.value_units);
        Ok(())
    }

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        info!("Status: {}", serde_json::to_string(snapshot)?);
        Ok(())
    }
}
