// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! LumiSense - Luminosity Sensing Module
//!
//! Drives I2C ambient light sensors and reports lux values:
//! - TSL2561 (CS and T/FN/CL packages) with fixed-point lux conversion
//! - MAX44009 with on-chip ranging
//! - Software auto-ranging over gain and integration time
//! - Change-triggered MQTT publication with periodic keep-alive resends
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      LumiSense Engine                   │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌─────────────┐  │
//! │  │  Luminosity  │ → │   Status     │ → │  Reporter   │  │
//! │  │  Manager     │   │   Snapshot   │   │  (MQTT)     │  │
//! │  └──────────────┘   └──────────────┘   └─────────────┘  │
//! │     ↓       ↓                                 ↑         │
//! │  ┌──────┐ ┌──────────┐                   ┌─────────┐    │
//! │  │Slots │ │AutoRanger│                   │ Orders  │    │
//! │  └──────┘ └──────────┘                   └─────────┘    │
//! │     ↓                                                   │
//! │  ┌────────────────────────────────────────────────┐     │
//! │  │   Register bus (i2cdev / simulated)            │     │
//! │  └────────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod sensors;
pub mod streaming;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use config::Config;
pub use core::Engine;
pub use error::{BusError, LumiError, LumiResult};
pub use sensors::{LuminosityManager, RegisterBus, SimulatedBus, SlotId, StatusSnapshot};
pub use streaming::{LogReporter, MqttReporter, Order, Reporter};

/// LumiSense version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
