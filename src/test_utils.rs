// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Test utilities
//!
//! A register-level fake of the I2C bus that emulates just enough of the
//! TSL2561 and MAX44009 to exercise drivers, slots and the manager, plus a
//! reporter that records what the engine publishes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BusError;
use crate::sensors::{RegisterBus, StatusSnapshot};
use crate::streaming::{Reporter, ValueMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeKind {
    Tsl2561,
    Max44009,
}

#[derive(Debug)]
struct FakeDevice {
    kind: FakeKind,
    registers: HashMap<u8, u8>,
    /// Fixed counts, returned whatever the timing register says
    channels: Option<(u16, u16)>,
    /// Counts at 16x / 402 ms, scaled by the programmed timing
    scene: Option<(f64, f64)>,
    acquisitions: usize,
}

impl FakeDevice {
    fn key(&self, reg: u8) -> u8 {
        match self.kind {
            // strip command/word/block bits
            FakeKind::Tsl2561 => reg & 0x0f,
            FakeKind::Max44009 => reg,
        }
    }

    fn counts(&self) -> (u16, u16) {
        if let Some(fixed) = self.channels {
            return fixed;
        }
        let Some((broadband, infrared)) = self.scene else {
            return (0, 0);
        };

        let timing = self.registers.get(&0x01).copied().unwrap_or(0x12);
        let gain = if timing & 0x10 != 0 { 1.0 } else { 1.0 / 16.0 };
        let (time, max) = match timing & 0x03 {
            0x00 => (13.7 / 402.0, 5047.0),
            0x01 => (101.0 / 402.0, 37177.0),
            _ => (1.0, 65535.0),
        };
        let scale = |v: f64| (v * gain * time).min(max) as u16;
        (scale(broadband), scale(infrared))
    }
}

#[derive(Debug, Default)]
pub struct FakeBus {
    devices: HashMap<u8, FakeDevice>,
    failing: HashSet<u8>,
    settled: Vec<Duration>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// TSL2561 answering with `id` in its ID register
    pub fn add_tsl2561(&mut self, addr: u8, id: u8) {
        let registers = HashMap::from([(0x00, 0x00), (0x01, 0x12), (0x0a, id)]);
        self.devices.insert(addr, FakeDevice {
            kind: FakeKind::Tsl2561,
            registers,
            channels: None,
            scene: None,
            acquisitions: 0,
        });
    }

    pub fn add_max44009(&mut self, addr: u8) {
        let registers = HashMap::from([(0x02, 0x03), (0x05, 0xff), (0x06, 0x00), (0x07, 0xff)]);
        self.devices.insert(addr, FakeDevice {
            kind: FakeKind::Max44009,
            registers,
            channels: None,
            scene: None,
            acquisitions: 0,
        });
    }

    pub fn set_channels(&mut self, addr: u8, broadband: u16, infrared: u16) {
        if let Some(dev) = self.devices.get_mut(&addr) {
            dev.channels = Some((broadband, infrared));
            dev.scene = None;
        }
    }

    pub fn set_scene(&mut self, addr: u8, broadband: f64, infrared: f64) {
        if let Some(dev) = self.devices.get_mut(&addr) {
            dev.scene = Some((broadband, infrared));
            dev.channels = None;
        }
    }

    pub fn set_lux_registers(&mut self, addr: u8, high: u8, low: u8) {
        if let Some(dev) = self.devices.get_mut(&addr) {
            dev.registers.insert(0x03, high);
            dev.registers.insert(0x04, low);
        }
    }

    /// Make every transfer to `addr` fail until healed.
    pub fn fail_address(&mut self, addr: u8) {
        self.failing.insert(addr);
    }

    pub fn heal_address(&mut self, addr: u8) {
        self.failing.remove(&addr);
    }

    pub fn register(&self, addr: u8, reg: u8) -> Option<u8> {
        let dev = self.devices.get(&addr)?;
        dev.registers.get(&dev.key(reg)).copied()
    }

    /// Number of channel acquisitions (broadband reads) seen by `addr`
    pub fn acquisitions(&self, addr: u8) -> usize {
        self.devices.get(&addr).map_or(0, |d| d.acquisitions)
    }

    pub fn settled(&self) -> Vec<Duration> {
        self.settled.clone()
    }

    fn device(&mut self, addr: u8, reg: u8, write: bool) -> Result<&mut FakeDevice, BusError> {
        let nack = |reason: &str| {
            if write {
                BusError::Write { addr, reg, reason: reason.to_string() }
            } else {
                BusError::Read { addr, reg, reason: reason.to_string() }
            }
        };
        if self.failing.contains(&addr) {
            return Err(nack("injected failure"));
        }
        self.devices.get_mut(&addr).ok_or_else(|| nack("no ack"))
    }
}

impl RegisterBus for FakeBus {
    fn read_register(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        let dev = self.device(addr, reg, false)?;
        let key = dev.key(reg);
        Ok(dev.registers.get(&key).copied().unwrap_or(0))
    }

    fn write_register(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        let dev = self.device(addr, reg, true)?;
        let key = dev.key(reg);
        dev.registers.insert(key, value);
        Ok(())
    }

    fn read_word(&mut self, addr: u8, reg: u8) -> Result<u16, BusError> {
        let dev = self.device(addr, reg, false)?;
        let key = dev.key(reg);
        let powered = dev.registers.get(&0x00).copied() == Some(0x03);

        match (dev.kind, key) {
            (FakeKind::Tsl2561, 0x0c) => {
                dev.acquisitions += 1;
                Ok(if powered { dev.counts().0 } else { 0 })
            }
            (FakeKind::Tsl2561, 0x0e) => Ok(if powered { dev.counts().1 } else { 0 }),
            _ => {
                let low = dev.registers.get(&key).copied().unwrap_or(0);
                let high = dev.registers.get(&key.wrapping_add(1)).copied().unwrap_or(0);
                Ok(u16::from_le_bytes([low, high]))
            }
        }
    }

    fn settle(&mut self, duration: Duration) {
        self.settled.push(duration);
    }
}

#[derive(Debug, Default)]
struct Recorded {
    values: Vec<ValueMessage>,
    statuses: Vec<StatusSnapshot>,
    shutdowns: usize,
}

/// Reporter keeping everything it was asked to publish. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    recorded: Arc<Mutex<Recorded>>,
    fail_after: Option<usize>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` values, fail every one after that
    pub fn failing_after(n: usize) -> Self {
        Self { fail_after: Some(n), ..Self::default() }
    }

    pub fn values(&self) -> Vec<ValueMessage> {
        self.recorded.lock().unwrap().values.clone()
    }

    pub fn statuses(&self) -> Vec<StatusSnapshot> {
        self.recorded.lock().unwrap().statuses.clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.recorded.lock().unwrap().shutdowns
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn publish_value(&self, message: &ValueMessage) -> anyhow::Result<()> {
        let mut recorded = self.recorded.lock().unwrap();
        if self.fail_after.map_or(false, |n| recorded.values.len() >= n) {
            anyhow::bail!("broker unreachable");
        }
        recorded.values.push(message.clone());
        Ok(())
    }

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        self.recorded.lock().unwrap().statuses.push(snapshot.clone());
        Ok(())
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.recorded.lock().unwrap().shutdowns += 1;
        Ok(())
    }
}
