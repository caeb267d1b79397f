// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Chip detection and dispatch over the supported drivers

use super::bus::RegisterBus;
use super::max44009::{self, Max44009};
use super::traits::{ChannelSampler, ChipKind, LuxResult, RangeSetting, Sample};
use super::tsl2561::{self, Tsl2561};
use crate::error::BusError;

/// Driver for one physical chip, chosen once when the sensor is added.
#[derive(Debug, Clone)]
pub enum Driver {
    Tsl2561(Tsl2561),
    Max44009(Max44009),
}

/// Every address a supported chip can answer on, in probe order.
pub fn known_addresses() -> Vec<u8> {
    tsl2561::ADDRESSES
        .iter()
        .chain(max44009::ADDRESSES.iter())
        .copied()
        .collect()
}

/// Which supported chip, if any, answers at `addr`.
pub fn probe<B: RegisterBus>(bus: &mut B, addr: u8) -> Option<ChipKind> {
    Driver::detect(bus, addr).map(|d| d.chip())
}

impl Driver {
    /// Build the driver matching the chip found at `addr`.
    pub fn detect<B: RegisterBus>(bus: &mut B, addr: u8) -> Option<Self> {
        if let Some(package) = tsl2561::identify(bus, addr) {
            return Some(Driver::Tsl2561(Tsl2561::new(addr, package)));
        }
        if max44009::identify(bus, addr) {
            return Some(Driver::Max44009(Max44009::new(addr)));
        }
        None
    }
}

macro_rules! dispatch {
    ($self:expr, $chip:ident => $body:expr) => {
        match $self {
            Driver::Tsl2561($chip) => $body,
            Driver::Max44009($chip) => $body,
        }
    };
}

impl ChannelSampler for Driver {
    fn chip(&self) -> ChipKind {
        dispatch!(self, c => c.chip())
    }

    fn address(&self) -> u8 {
        dispatch!(self, c => c.address())
    }

    fn range(&self) -> RangeSetting {
        dispatch!(self, c => c.range())
    }

    fn supports_ranging(&self) -> bool {
        dispatch!(self, c => c.supports_ranging())
    }

    fn init<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        dispatch!(self, c => c.init(bus))
    }

    fn power_on<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        dispatch!(self, c => c.power_on(bus))
    }

    fn power_off<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        dispatch!(self, c => c.power_off(bus))
    }

    fn apply_range<B: RegisterBus>(&mut self, bus: &mut B, setting: RangeSetting) -> Result<(), BusError> {
        dispatch!(self, c => c.apply_range(bus, setting))
    }

    fn acquire<B: RegisterBus>(&mut self, bus: &mut B) -> Result<Sample, BusError> {
        dispatch!(self, c => c.acquire(bus))
    }

    fn convert(&self, sample: &Sample) -> LuxResult {
        dispatch!(self, c => c.convert(sample))
    }
}
