// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::sensors::{known_addresses, DEFAULT_CAPACITY, DEFAULT_COOLDOWN_SECS, MAX_COOLDOWN_SECS, MIN_COOLDOWN_SECS};
use crate::streaming::StreamingConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Log level
    pub log_level: String,

    /// Enable demo mode (simulated bus)
    pub demo_mode: bool,

    /// Sensor configuration
    pub sensors: SensorConfig,

    /// Streaming configuration
    pub streaming: StreamingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "LumiSense".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            demo_mode: true,
            sensors: SensorConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("lumisense"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Reject unusable settings and clamp the cooldown into range.
    pub fn validate(&mut self) -> Result<()> {
        let sensors = &mut self.sensors;
        if sensors.max_sensors == 0 {
            return Err(anyhow!("sensors.max_sensors must be at least 1"));
        }
        if sensors.max_sensors > 256 {
            return Err(anyhow!("sensors.max_sensors must be at most 256"));
        }

        let clamped = sensors.cooldown_secs.clamp(MIN_COOLDOWN_SECS, MAX_COOLDOWN_SECS);
        if clamped != sensors.cooldown_secs {
            warn!(
                "sensors.cooldown_secs {} out of [{}, {}], using {}",
                sensors.cooldown_secs, MIN_COOLDOWN_SECS, MAX_COOLDOWN_SECS, clamped
            );
            sensors.cooldown_secs = clamped;
        }

        if self.streaming.mqtt_enabled && self.streaming.base_topic.is_empty() {
            return Err(anyhow!("streaming.base_topic must not be empty"));
        }
        Ok(())
    }
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// I2C adapter device node
    pub bus_path: PathBuf,

    /// Addresses probed at startup
    pub addresses: Vec<u8>,

    /// Seconds between two acquisitions of the same sensor
    pub cooldown_secs: u64,

    /// Software auto-ranging for sensors that support it
    pub auto_range: bool,

    /// Number of sensor slots
    pub max_sensors: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            bus_path: PathBuf::from("/dev/i2c-1"),
            addresses: known_addresses(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            auto_range: true,
            max_sensors: DEFAULT_CAPACITY,
        }
    }
}
