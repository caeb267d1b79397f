// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated I2C bus for demo mode
//!
//! Answers like a TSL2561 (T/FN/CL package) at 0x39 and a MAX44009 at 0x4a,
//! both looking at the same slowly drifting scene.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Duration;

use rand::prelude::*;
use rand_distr::StandardNormal;

use super::bus::RegisterBus;
use crate::error::BusError;

pub const SIM_TSL2561_ADDR: u8 = 0x39;
pub const SIM_MAX44009_ADDR: u8 = 0x4a;

// lux per broadband count at 16x / 402 ms with a 0.3 IR share
const LUX_PER_COUNT: f64 = 0.019;
const IR_SHARE: f64 = 0.3;
// centre of the simulated scene
const BASE_LUX: f64 = 300.0;

pub struct SimulatedBus {
    rng: StdRng,
    tsl: HashMap<u8, u8>,
    max: HashMap<u8, u8>,

    // Scene state
    drift: f64,
    phase: f64,
    glitch_probability: f64,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Reproducible scene
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            tsl: HashMap::from([(0x00, 0x00), (0x01, 0x12), (0x0a, 0x50)]),
            max: HashMap::from([(0x02, 0x03), (0x05, 0xff), (0x06, 0x00), (0x07, 0xff)]),
            drift: 0.0,
            phase: 0.0,
            glitch_probability: 0.0,
        }
    }

    /// Chance that any transfer fails
    pub fn with_glitches(mut self, probability: f64) -> Self {
        self.glitch_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Current scene brightness; advances the simulation one step.
    fn scene_lux(&mut self) -> f64 {
        self.phase += 2.0 * PI / 240.0;
        self.drift = (self.drift + self.rng.gen_range(-0.01..0.01)).clamp(-0.5, 0.5);
        let noise: f64 = self.rng.sample::<f64, _>(StandardNormal) * 0.02;
        let cycle = 1.0 + 0.8 * self.phase.sin();
        (BASE_LUX * cycle * (1.0 + self.drift + noise)).max(0.0)
    }

    /// Channel counts the TSL2561 would report under its current timing
    fn tsl_counts(&mut self) -> (u16, u16) {
        if self.tsl.get(&0x00).copied() != Some(0x03) {
            return (0, 0);
        }
        let broadband = self.scene_lux() / LUX_PER_COUNT;
        let timing = self.tsl.get(&0x01).copied().unwrap_or(0x12);
        let gain = if timing & 0x10 != 0 { 1.0 } else { 1.0 / 16.0 };
        let (time, max) = match timing & 0x03 {
            0x00 => (13.7 / 402.0, 5047.0),
            0x01 => (101.0 / 402.0, 37177.0),
            _ => (1.0, 65535.0),
        };
        let scale = |v: f64| (v * gain * time).min(max) as u16;
        (scale(broadband), scale(broadband * IR_SHARE))
    }

    /// Refresh the MAX44009 lux registers from the scene
    fn update_max_registers(&mut self) {
        let (high, low) = encode_max44009(self.scene_lux());
        self.max.insert(0x03, high);
        self.max.insert(0x04, low);
    }

    fn glitch(&mut self, addr: u8, reg: u8, write: bool) -> Result<(), BusError> {
        if self.glitch_probability > 0.0 && self.rng.gen_bool(self.glitch_probability) {
            let reason = "simulated glitch".to_string();
            return Err(if write {
                BusError::Write { addr, reg, reason }
            } else {
                BusError::Read { addr, reg, reason }
            });
        }
        Ok(())
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponent/mantissa register pair for `lux`, saturating at the top of range.
pub fn encode_max44009(lux: f64) -> (u8, u8) {
    let mut mantissa = (lux / 0.045).round().max(0.0);
    let mut exponent = 0u8;
    while mantissa > 255.0 && exponent < 14 {
        mantissa = (mantissa / 2.0).round();
        exponent += 1;
    }
    let mantissa = mantissa.min(255.0) as u8;
    ((exponent << 4) | (mantissa >> 4), mantissa & 0x0f)
}

impl RegisterBus for SimulatedBus {
    fn read_register(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        self.glitch(addr, reg, false)?;
        match addr {
            SIM_TSL2561_ADDR => Ok(self.tsl.get(&(reg & 0x0f)).copied().unwrap_or(0)),
            SIM_MAX44009_ADDR => {
                if reg == 0x03 {
                    self.update_max_registers();
                }
                Ok(self.max.get(&reg).copied().unwrap_or(0))
            }
            _ => Err(BusError::Read { addr, reg, reason: "no ack".to_string() }),
        }
    }

    fn write_register(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.glitch(addr, reg, true)?;
        match addr {
            SIM_TSL2561_ADDR => {
                self.tsl.insert(reg & 0x0f, value);
                Ok(())
            }
            SIM_MAX44009_ADDR => {
                self.max.insert(reg, value);
                Ok(())
            }
            _ => Err(BusError::Write { addr, reg, reason: "no ack".to_string() }),
        }
    }

    fn read_word(&mut self, addr: u8, reg: u8) -> Result<u16, BusError> {
        self.glitch(addr, reg, false)?;
        if addr != SIM_TSL2561_ADDR {
            return Err(BusError::Read { addr, reg, reason: "word read unsupported".to_string() });
        }
        match reg & 0x0f {
            0x0c => Ok(self.tsl_counts().0),
            0x0e => Ok(self.tsl_counts().1),
            key => {
                let low = self.tsl.get(&key).copied().unwrap_or(0);
                let high = self.tsl.get(&key.wrapping_add(1)).copied().unwrap_or(0);
                Ok(u16::from_le_bytes([low, high]))
            }
        }
    }

    // Simulated conversions are instantaneous.
    fn settle(&mut self, _duration: Duration) {}
}
