// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! MAX44009 ambient light sensor
//!
//! The chip ranges and converts on its own and exposes lux as an
//! exponent/mantissa pair, so software auto-ranging is not used. Ranges set
//! explicitly are programmed through manual mode.

use std::time::Duration;

use tracing::debug;

use super::bus::RegisterBus;
use super::lux::convert_max44009;
use super::traits::{ChannelSampler, ChipKind, Gain, IntegrationTime, LuxResult, RangeSetting, RawChannels, Sample};
use crate::error::BusError;

/// A0 pin low, high
pub const ADDRESSES: [u8; 2] = [0x4a, 0x4b];

const REG_CONFIG: u8 = 0x02;
const REG_LUX_HIGH: u8 = 0x03;
const REG_LUX_LOW: u8 = 0x04;
const REG_THRESHOLD_UPPER: u8 = 0x05;
const REG_THRESHOLD_LOWER: u8 = 0x06;

const CONFIG_MANUAL: u8 = 0x40;
const CONFIG_CDR: u8 = 0x08;

/// Power-on defaults of the threshold registers identify the part.
pub fn identify<B: RegisterBus>(bus: &mut B, addr: u8) -> bool {
    if !ADDRESSES.contains(&addr) {
        return false;
    }
    let upper = bus.read_register(addr, REG_THRESHOLD_UPPER);
    let lower = bus.read_register(addr, REG_THRESHOLD_LOWER);
    matches!((upper, lower), (Ok(0xff), Ok(0x00)))
}

/// Manual-mode configuration for a range setting
pub fn config_value(setting: RangeSetting) -> u8 {
    let cdr = match setting.gain {
        Gain::Low => CONFIG_CDR, // photocurrent divided by 8
        Gain::High => 0x00,
    };
    let tim = match setting.integration {
        IntegrationTime::Short => 0b110,  // 12.5 ms
        IntegrationTime::Medium => 0b011, // 100 ms
        IntegrationTime::Long => 0b000,   // 800 ms
    };
    CONFIG_MANUAL | cdr | tim
}

fn manual_settle(integration: IntegrationTime) -> Duration {
    match integration {
        IntegrationTime::Short => Duration::from_millis(13),
        IntegrationTime::Medium => Duration::from_millis(100),
        IntegrationTime::Long => Duration::from_millis(800),
    }
}

#[derive(Debug, Clone)]
pub struct Max44009 {
    address: u8,
    range: RangeSetting,
    manual: bool,
}

impl Max44009 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            range: RangeSetting::default(),
            manual: false,
        }
    }

    /// Whether a range was forced through manual mode
    pub fn is_manual(&self) -> bool {
        self.manual
    }
}

impl ChannelSampler for Max44009 {
    fn chip(&self) -> ChipKind {
        ChipKind::Max44009
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn range(&self) -> RangeSetting {
        self.range
    }

    fn supports_ranging(&self) -> bool {
        false
    }

    fn init<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        // default mode: automatic range, one conversion every 800 ms
        bus.write_register(self.address, REG_CONFIG, 0x00)?;
        self.manual = false;
        Ok(())
    }

    // No shutdown mode on this part; it draws ~0.65 uA while converting.
    fn power_on<B: RegisterBus>(&mut self, _bus: &mut B) -> Result<(), BusError> {
        Ok(())
    }

    fn power_off<B: RegisterBus>(&mut self, _bus: &mut B) -> Result<(), BusError> {
        Ok(())
    }

    fn apply_range<B: RegisterBus>(&mut self, bus: &mut B, setting: RangeSetting) -> Result<(), BusError> {
        bus.write_register(self.address, REG_CONFIG, config_value(setting))?;
        bus.settle(manual_settle(setting.integration));

        debug!("MAX44009 {:#04x}: manual range {:?}", self.address, setting);
        self.range = setting;
        self.manual = true;
        Ok(())
    }

    fn acquire<B: RegisterBus>(&mut self, bus: &mut B) -> Result<Sample, BusError> {
        let high = bus.read_register(self.address, REG_LUX_HIGH)?;
        let low = bus.read_register(self.address, REG_LUX_LOW)?;
        Ok(Sample {
            raw: RawChannels::new((u16::from(high) << 8) | u16::from(low), 0),
            setting: self.range,
        })
    }

    fn convert(&self, sample: &Sample) -> LuxResult {
        convert_max44009(sample.raw)
    }
}
