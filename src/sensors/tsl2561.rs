// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! TSL2561 broadband/infrared light-to-digital converter

use tracing::debug;

use super::bus::RegisterBus;
use super::lux::LuxConverter;
use super::traits::{ChannelSampler, ChipKind, Gain, IntegrationTime, LuxResult, PackageVariant, RangeSetting, RawChannels, Sample};
use crate::error::BusError;

/// Address select pin low, floating, high
pub const ADDRESSES: [u8; 3] = [0x29, 0x39, 0x49];

const COMMAND_BIT: u8 = 0x80;
const WORD_BIT: u8 = 0x20;

const CONTROL_POWERON: u8 = 0x03;
const CONTROL_POWEROFF: u8 = 0x00;

const REG_CONTROL: u8 = 0x00;
const REG_TIMING: u8 = 0x01;
const REG_ID: u8 = 0x0A;
const REG_CHAN0_LOW: u8 = 0x0C;
const REG_CHAN1_LOW: u8 = 0x0E;

// PARTNO field of the ID register
const PARTNO_TSL2561_CS: u8 = 0x10;
const PARTNO_TSL2561_T_FN_CL: u8 = 0x50;

/// Check whether a TSL2561 answers at `addr` and report its package.
pub fn identify<B: RegisterBus>(bus: &mut B, addr: u8) -> Option<PackageVariant> {
    if !ADDRESSES.contains(&addr) {
        return None;
    }
    let id = bus.read_register(addr, COMMAND_BIT | REG_ID).ok()?;
    match id & 0xf0 {
        PARTNO_TSL2561_CS => Some(PackageVariant::Cs),
        PARTNO_TSL2561_T_FN_CL => Some(PackageVariant::TFnCl),
        _ => None,
    }
}

/// Timing register encoding of a range setting
pub fn timing_value(setting: RangeSetting) -> u8 {
    let gain = match setting.gain {
        Gain::Low => 0x00,
        Gain::High => 0x10,
    };
    let integration = match setting.integration {
        IntegrationTime::Short => 0x00,
        IntegrationTime::Medium => 0x01,
        IntegrationTime::Long => 0x02,
    };
    gain | integration
}

#[derive(Debug, Clone)]
pub struct Tsl2561 {
    address: u8,
    range: RangeSetting,
    converter: LuxConverter,
}

impl Tsl2561 {
    pub fn new(address: u8, package: PackageVariant) -> Self {
        Self {
            address,
            range: RangeSetting::default(),
            converter: LuxConverter::new(package),
        }
    }

    pub fn package(&self) -> PackageVariant {
        self.converter.package()
    }

    fn read_channels<B: RegisterBus>(&self, bus: &mut B) -> Result<RawChannels, BusError> {
        let broadband = bus.read_word(self.address, COMMAND_BIT | WORD_BIT | REG_CHAN0_LOW)?;
        let infrared = bus.read_word(self.address, COMMAND_BIT | WORD_BIT | REG_CHAN1_LOW)?;
        Ok(RawChannels::new(broadband, infrared))
    }
}

impl ChannelSampler for Tsl2561 {
    fn chip(&self) -> ChipKind {
        ChipKind::Tsl2561
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn range(&self) -> RangeSetting {
        self.range
    }

    fn supports_ranging(&self) -> bool {
        true
    }

    fn init<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        self.apply_range(bus, self.range)
    }

    fn power_on<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        bus.write_register(self.address, COMMAND_BIT | REG_CONTROL, CONTROL_POWERON)
    }

    fn power_off<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        bus.write_register(self.address, COMMAND_BIT | REG_CONTROL, CONTROL_POWEROFF)
    }

    fn apply_range<B: RegisterBus>(&mut self, bus: &mut B, setting: RangeSetting) -> Result<(), BusError> {
        self.power_on(bus)?;
        let written = bus.write_register(self.address, COMMAND_BIT | REG_TIMING, timing_value(setting));
        self.power_off(bus)?;
        written?;

        debug!("TSL2561 {:#04x}: range {:?}", self.address, setting);
        self.range = setting;
        Ok(())
    }

    fn acquire<B: RegisterBus>(&mut self, bus: &mut B) -> Result<Sample, BusError> {
        self.power_on(bus)?;
        bus.settle(self.range.integration.settle_time());
        let raw = self.read_channels(bus);
        let off = self.power_off(bus);

        let raw = raw?;
        off?;
        Ok(Sample { raw, setting: self.range })
    }

    fn convert(&self, sample: &Sample) -> LuxResult {
        self.converter.convert(sample.raw, sample.setting)
    }
}
