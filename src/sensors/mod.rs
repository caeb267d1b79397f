// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor module - light sensor drivers, lux conversion and the slot manager

mod autorange;
mod bus;
mod driver;
mod lux;
mod manager;
mod max44009;
mod simulator;
mod slot;
mod snapshot;
mod traits;
mod tsl2561;

pub use autorange::{thresholds, AutoRanger, RangeDecision, RangerState};
pub use bus::RegisterBus;
#[cfg(feature = "hardware")]
pub use bus::I2cdevBus;
pub use driver::{known_addresses, probe, Driver};
pub use lux::{convert_max44009, LuxConverter};
pub use manager::{
    LuminosityManager, ScanReport, TriggeredValue, DEFAULT_CAPACITY, DEFAULT_COOLDOWN_SECS,
    MAX_COOLDOWN_SECS, MIN_COOLDOWN_SECS,
};
pub use max44009::Max44009;
pub use simulator::{SimulatedBus, SIM_MAX44009_ADDR, SIM_TSL2561_ADDR};
pub use slot::{ScanOutcome, SensorSlot, SlotId, SlotStatus};
pub use snapshot::{StatusSnapshot, UNITS};
pub use traits::{
    ChannelSampler, ChipKind, Gain, IntegrationTime, LuxResult, PackageVariant, RangeSetting,
    RawChannels, Sample,
};
pub use tsl2561::Tsl2561;
