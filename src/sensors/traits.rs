// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::bus::RegisterBus;
use crate::error::{BusError, LumiError, LumiResult};

/// Light sensor chips supported by lumisense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChipKind {
    Tsl2561,    // broadband + infrared photodiodes
    Max44009,   // ranges in hardware, reports lux registers
}

impl ChipKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChipKind::Tsl2561 => "TSL2561",
            ChipKind::Max44009 => "MAX44009",
        }
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// TSL2561 package variants; each has its own lux coefficient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageVariant {
    /// Chipscale package
    Cs,
    /// T, FN and CL packages (all common breakout boards)
    TFnCl,
}

impl Default for PackageVariant {
    fn default() -> Self {
        PackageVariant::TFnCl
    }
}

/// Analog gain of the photodiode front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gain {
    Low,    // 1x
    High,   // 16x
}

/// Exposure window of one acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntegrationTime {
    Short,   // 13.7 ms
    Medium,  // 101 ms
    Long,    // 402 ms
}

impl IntegrationTime {
    /// Time to wait after power-up before the channels hold a full sample.
    pub fn settle_time(&self) -> Duration {
        match self {
            IntegrationTime::Short => Duration::from_millis(14),
            IntegrationTime::Medium => Duration::from_millis(102),
            IntegrationTime::Long => Duration::from_millis(403),
        }
    }

    pub fn shorter(&self) -> Option<Self> {
        match self {
            IntegrationTime::Short => None,
            IntegrationTime::Medium => Some(IntegrationTime::Short),
            IntegrationTime::Long => Some(IntegrationTime::Medium),
        }
    }

    pub fn longer(&self) -> Option<Self> {
        match self {
            IntegrationTime::Short => Some(IntegrationTime::Medium),
            IntegrationTime::Medium => Some(IntegrationTime::Long),
            IntegrationTime::Long => None,
        }
    }
}

/// Gain and integration time governing a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeSetting {
    pub gain: Gain,
    pub integration: IntegrationTime,
}

impl RangeSetting {
    pub const fn new(gain: Gain, integration: IntegrationTime) -> Self {
        Self { gain, integration }
    }

    /// Next setting with less sensitivity: drop the gain first, then
    /// shorten the integration time. `None` at the bottom of the range.
    pub fn lower_sensitivity(&self) -> Option<Self> {
        match self.gain {
            Gain::High => Some(Self::new(Gain::Low, self.integration)),
            Gain::Low => self.integration.shorter().map(|t| Self::new(Gain::Low, t)),
        }
    }

    /// Mirror of [`RangeSetting::lower_sensitivity`]: lengthen the
    /// integration time first, then raise the gain.
    pub fn higher_sensitivity(&self) -> Option<Self> {
        match self.integration.longer() {
            Some(t) => Some(Self::new(self.gain, t)),
            None if self.gain == Gain::Low => Some(Self::new(Gain::High, self.integration)),
            None => None,
        }
    }
}

impl Default for RangeSetting {
    fn default() -> Self {
        Self::new(Gain::High, IntegrationTime::Long)
    }
}

/// Raw photodiode counts of one acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChannels {
    pub broadband: u16,
    pub infrared: u16,
}

impl RawChannels {
    pub const fn new(broadband: u16, infrared: u16) -> Self {
        Self { broadband, infrared }
    }
}

/// Raw counts tagged with the setting that was active while they were taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub raw: RawChannels,
    pub setting: RangeSetting,
}

/// Outcome of a lux conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuxResult {
    pub lux: f32,
    /// `false` on saturation or undefined channel ratio
    pub valid: bool,
}

impl LuxResult {
    pub fn valid(lux: f32) -> Self {
        Self { lux: lux.max(0.0), valid: true }
    }

    pub fn invalid() -> Self {
        Self { lux: 0.0, valid: false }
    }

    /// Lux value, or `ConversionInvalid` for an unusable sample
    pub fn checked(self) -> LumiResult<f32> {
        if self.valid {
            Ok(self.lux)
        } else {
            Err(LumiError::ConversionInvalid)
        }
    }
}

/// Capabilities every supported chip driver provides.
///
/// Drivers hold their own current [`RangeSetting`]; every [`Sample`] they
/// return is stamped with it, so a reading can never be attributed to a
/// setting that was not active during the acquisition.
pub trait ChannelSampler {
    /// Chip family
    fn chip(&self) -> ChipKind;

    /// Bus address the chip answers on
    fn address(&self) -> u8;

    /// Setting currently applied to the chip
    fn range(&self) -> RangeSetting;

    /// Whether gain and integration are chosen by software auto-ranging.
    /// Chips that range in hardware return `false`.
    fn supports_ranging(&self) -> bool;

    /// Bring the chip out of reset and put it in a known configuration.
    fn init<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError>;

    fn power_on<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError>;

    fn power_off<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), BusError>;

    /// Program a new gain/integration time. The next acquisition is the
    /// first one attributed to `setting`.
    fn apply_range<B: RegisterBus>(&mut self, bus: &mut B, setting: RangeSetting) -> Result<(), BusError>;

    /// Take one sample, waiting out the integration time.
    fn acquire<B: RegisterBus>(&mut self, bus: &mut B) -> Result<Sample, BusError>;

    /// Convert a sample taken by this chip into lux.
    fn convert(&self, sample: &Sample) -> LuxResult;
}
