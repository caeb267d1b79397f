// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Per-sensor state owned by the luminosity manager

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::autorange::{AutoRanger, RangeDecision};
use super::bus::RegisterBus;
use super::driver::Driver;
use super::traits::{ChannelSampler, ChipKind, LuxResult, RangeSetting};
use crate::error::BusError;

/// Handle of a slot in the manager's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u8);

impl SlotId {
    pub fn index(&self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of one slot's scan step
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Still within cooldown, nothing acquired
    Skipped,
    /// Valid reading stored
    Updated { lux: f32, triggered: bool, reranged: bool },
    /// Saturated or undefined sample; no trigger this cycle
    Invalid { reranged: bool },
    /// Bus failure; retried next cooldown
    Failed(BusError),
}

/// Serializable view of a slot for status reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub id: SlotId,
    pub chip: ChipKind,
    pub sub_id: String,
    pub range: RangeSetting,
    pub auto_range: bool,
    pub value: Option<f32>,
    pub valid: bool,
    pub trigger: bool,
    pub failures: u32,
}

pub struct SensorSlot {
    driver: Driver,
    ranger: AutoRanger,
    last_result: Option<LuxResult>,
    value: Option<f32>,
    last_sent: Option<i64>,
    trigger: bool,
    next_due: Option<Instant>,
    failures: u32,
}

impl SensorSlot {
    pub fn new(driver: Driver, auto_range: bool) -> Self {
        Self {
            driver,
            ranger: AutoRanger::new(auto_range),
            last_result: None,
            value: None,
            last_sent: None,
            trigger: false,
            next_due: None,
            failures: 0,
        }
    }

    pub fn chip(&self) -> ChipKind {
        self.driver.chip()
    }

    pub fn address(&self) -> u8 {
        self.driver.address()
    }

    /// Identifier used in published messages: the decimal bus address.
    pub fn sub_id(&self) -> String {
        self.address().to_string()
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub(crate) fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    pub fn range(&self) -> RangeSetting {
        self.driver.range()
    }

    /// Program `setting` on the chip; the slot reports it once applied.
    pub fn apply_range<B: RegisterBus>(&mut self, bus: &mut B, setting: RangeSetting) -> Result<(), BusError> {
        self.driver.apply_range(bus, setting)?;
        self.ranger.reset();
        Ok(())
    }

    pub fn auto_range(&self) -> bool {
        self.ranger.enabled()
    }

    pub fn set_auto_range(&mut self, enabled: bool) {
        self.ranger.set_enabled(enabled);
    }

    pub fn ranger(&self) -> &AutoRanger {
        &self.ranger
    }

    /// Last converted result, valid or not
    pub fn last_result(&self) -> Option<LuxResult> {
        self.last_result
    }

    /// Last valid lux value
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn trigger(&self) -> bool {
        self.trigger
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.map_or(true, |due| now >= due)
    }

    /// Run one scan step if the cooldown has elapsed.
    pub fn scan<B: RegisterBus>(&mut self, bus: &mut B, now: Instant, cooldown: Duration) -> ScanOutcome {
        if !self.is_due(now) {
            return ScanOutcome::Skipped;
        }
        self.next_due = Some(now + cooldown);

        match self.measure(bus) {
            Ok((result, reranged)) => {
                self.failures = 0;
                self.last_result = Some(result);
                match result.checked() {
                    Ok(lux) => {
                        let triggered = self.record(lux);
                        ScanOutcome::Updated { lux, triggered, reranged }
                    }
                    Err(e) => {
                        debug!("Slot {:#04x}: {}", self.address(), e);
                        ScanOutcome::Invalid { reranged }
                    }
                }
            }
            Err(e) => {
                self.ranger.reset();
                self.failures += 1;
                self.last_result = Some(LuxResult::invalid());
                ScanOutcome::Failed(e)
            }
        }
    }

    /// Acquire, let the ranger judge the sample and convert. At most one
    /// range change and re-acquisition happens per call.
    fn measure<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(LuxResult, bool), BusError> {
        let mut sample = self.driver.acquire(bus)?;
        let mut reranged = false;

        if self.driver.supports_ranging() {
            if let RangeDecision::Reacquire(next) = self.ranger.evaluate(&sample) {
                debug!("Slot {:#04x}: {:?} -> {:?}", self.address(), sample.setting, next);
                self.driver.apply_range(bus, next)?;
                sample = self.driver.acquire(bus)?;
                let decision = self.ranger.evaluate(&sample);
                debug_assert_eq!(decision, RangeDecision::Accept, "sample after a range change");
                reranged = true;
            }
        }

        Ok((self.driver.convert(&sample), reranged))
    }

    /// Store a valid value; set the trigger when its rounded value differs
    /// from what was last sent.
    fn record(&mut self, lux: f32) -> bool {
        self.value = Some(lux);
        if self.last_sent != Some(lux.round() as i64) {
            self.trigger = true;
        }
        self.trigger
    }

    /// Mark the current value as delivered.
    pub fn clear_trigger(&mut self) {
        if let Some(v) = self.value {
            self.last_sent = Some(v.round() as i64);
        }
        self.trigger = false;
    }

    pub fn status(&self, id: SlotId) -> SlotStatus {
        SlotStatus {
            id,
            chip: self.chip(),
            sub_id: self.sub_id(),
            range: self.range(),
            auto_range: self.auto_range(),
            value: self.value,
            valid: self.last_result.map_or(false, |r| r.valid),
            trigger: self.trigger,
            failures: self.failures,
        }
    }
}
