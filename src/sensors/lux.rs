// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Photometric conversion of raw channel counts into lux
//!
//! The TSL2561 path is the datasheet's fixed-point approximation: channels
//! are normalized to the 402 ms / 16x baseline, the infrared/broadband ratio
//! selects one of eight linear bands and the band coefficients weight the
//! two channels. No floating point is involved until the final value.

use super::traits::{Gain, IntegrationTime, LuxResult, PackageVariant, RangeSetting, RawChannels};

/// Lux values are scaled by 2^LUX_SCALE during the computation
pub const LUX_SCALE: u32 = 14;
/// Channel ratio is scaled by 2^RATIO_SCALE
pub const RATIO_SCALE: u32 = 9;
/// Channel counts are scaled by 2^CH_SCALE
pub const CH_SCALE: u32 = 10;

const CH_SCALE_TINT_SHORT: u64 = 0x7517; // 322/11 * 2^CH_SCALE
const CH_SCALE_TINT_MEDIUM: u64 = 0x0FE7; // 322/81 * 2^CH_SCALE
const CH_SCALE_TINT_LONG: u64 = 1 << CH_SCALE;

/// One linear segment: applies while `ratio <= k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub k: u64,
    pub b: u64,
    pub m: u64,
}

const fn band(k: u64, b: u64, m: u64) -> Band {
    Band { k, b, m }
}

/// T, FN and CL package coefficients
pub const T_FN_CL_BANDS: [Band; 8] = [
    band(0x0040, 0x01f2, 0x01be), // 0.125: 0.0304, 0.0272
    band(0x0080, 0x0214, 0x02d1), // 0.250: 0.0325, 0.0440
    band(0x00c0, 0x023f, 0x037b), // 0.375: 0.0351, 0.0544
    band(0x0100, 0x0270, 0x03fe), // 0.50:  0.0381, 0.0624
    band(0x0138, 0x016f, 0x01fc), // 0.61:  0.0224, 0.0310
    band(0x019a, 0x00d2, 0x00fb), // 0.80:  0.0128, 0.0153
    band(0x029a, 0x0018, 0x0012), // 1.3:   0.00146, 0.00112
    band(0x029a, 0x0000, 0x0000), // > 1.3
];

/// CS package coefficients
pub const CS_BANDS: [Band; 8] = [
    band(0x0043, 0x0204, 0x01ad), // 0.130: 0.0315, 0.0262
    band(0x0085, 0x0228, 0x02c1), // 0.260: 0.0337, 0.0430
    band(0x00c8, 0x0253, 0x0363), // 0.390: 0.0363, 0.0529
    band(0x010a, 0x0282, 0x03df), // 0.520: 0.0392, 0.0605
    band(0x014d, 0x0177, 0x01dd), // 0.65:  0.0229, 0.0291
    band(0x019a, 0x0101, 0x0127), // 0.80:  0.0157, 0.0180
    band(0x029a, 0x0037, 0x002b), // 1.3:   0.00338, 0.00260
    band(0x029a, 0x0000, 0x0000), // > 1.3
];

/// Counts at or above this value are treated as saturated.
pub fn clip_threshold(integration: IntegrationTime) -> u16 {
    match integration {
        IntegrationTime::Short => 4900,
        IntegrationTime::Medium => 37000,
        IntegrationTime::Long => 65000,
    }
}

/// Converter for one TSL2561 package variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuxConverter {
    package: PackageVariant,
}

impl LuxConverter {
    pub const fn new(package: PackageVariant) -> Self {
        Self { package }
    }

    pub fn package(&self) -> PackageVariant {
        self.package
    }

    fn bands(&self) -> &'static [Band; 8] {
        match self.package {
            PackageVariant::Cs => &CS_BANDS,
            PackageVariant::TFnCl => &T_FN_CL_BANDS,
        }
    }

    /// Convert a channel pair taken at `setting` into lux.
    pub fn convert(&self, raw: RawChannels, setting: RangeSetting) -> LuxResult {
        let clip = clip_threshold(setting.integration);
        if raw.broadband >= clip || raw.infrared >= clip {
            return LuxResult::invalid();
        }

        let (channel0, channel1) = normalize(raw, setting);
        let ratio = match channel_ratio(channel0, channel1) {
            Some(r) => r,
            None => return LuxResult::invalid(),
        };

        let band = select_band(self.bands(), ratio);
        let temp = (channel0 * band.b).saturating_sub(channel1 * band.m);
        let lux = (temp + (1 << (LUX_SCALE - 1))) >> LUX_SCALE;

        LuxResult::valid(lux as f32)
    }
}

impl Default for LuxConverter {
    fn default() -> Self {
        Self::new(PackageVariant::default())
    }
}

/// Scale both channels to the 402 ms / 16x baseline.
pub fn normalize(raw: RawChannels, setting: RangeSetting) -> (u64, u64) {
    let mut ch_scale = match setting.integration {
        IntegrationTime::Short => CH_SCALE_TINT_SHORT,
        IntegrationTime::Medium => CH_SCALE_TINT_MEDIUM,
        IntegrationTime::Long => CH_SCALE_TINT_LONG,
    };
    if setting.gain == Gain::Low {
        ch_scale <<= 4;
    }

    let channel0 = (u64::from(raw.broadband) * ch_scale) >> CH_SCALE;
    let channel1 = (u64::from(raw.infrared) * ch_scale) >> CH_SCALE;
    (channel0, channel1)
}

/// Infrared/broadband ratio scaled by 2^RATIO_SCALE, rounded.
/// `None` when broadband is zero.
pub fn channel_ratio(channel0: u64, channel1: u64) -> Option<u64> {
    if channel0 == 0 {
        return None;
    }
    let ratio1 = (channel1 << (RATIO_SCALE + 1)) / channel0;
    Some((ratio1 + 1) >> 1)
}

fn select_band(bands: &[Band; 8], ratio: u64) -> &Band {
    bands
        .iter()
        .find(|band| ratio <= band.k)
        .unwrap_or(&bands[bands.len() - 1])
}

/// MAX44009 lux registers: exponent in the high nibble of 0x03, mantissa
/// split over the low nibbles of 0x03 and 0x04. `raw.broadband` carries
/// `(reg03 << 8) | reg04`.
pub fn convert_max44009(raw: RawChannels) -> LuxResult {
    let high = (raw.broadband >> 8) as u8;
    let low = (raw.broadband & 0xff) as u8;

    let exponent = high >> 4;
    if exponent == 0x0f {
        // overrange
        return LuxResult::invalid();
    }
    let mantissa = (u32::from(high & 0x0f) << 4) | u32::from(low & 0x0f);

    LuxResult::valid((1u32 << exponent) as f32 * mantissa as f32 * 0.045)
}
