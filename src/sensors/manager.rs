// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Luminosity manager - owns every sensor slot and drives their sampling

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::bus::RegisterBus;
use super::driver::Driver;
use super::slot::{ScanOutcome, SensorSlot, SlotId};
use super::snapshot::{StatusSnapshot, UNITS};
use super::traits::{ChannelSampler, RangeSetting};
use crate::error::{LumiError, LumiResult};

pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
pub const MIN_COOLDOWN_SECS: u64 = 5;
pub const MAX_COOLDOWN_SECS: u64 = 3600;
pub const DEFAULT_CAPACITY: usize = 4;

/// A value waiting to be reported
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredValue {
    pub id: SlotId,
    pub value: f32,
    pub units: &'static str,
    pub sub_id: String,
}

/// Counters for one `scan_all` pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    pub skipped: usize,
    pub updated: usize,
    pub invalid: usize,
    pub failed: usize,
    pub reranged: usize,
    /// Module-level trigger after the pass
    pub triggered: bool,
}

/// Manages all luminosity sensors on one bus
pub struct LuminosityManager<B: RegisterBus> {
    bus: B,
    slots: Vec<Option<SensorSlot>>,
    cooldown: Duration,
    auto_range: bool,
}

impl<B: RegisterBus> LuminosityManager<B> {
    /// Manager with room for `capacity` sensors (at most 256).
    pub fn new(bus: B, capacity: usize) -> Self {
        let capacity = capacity.min(usize::from(u8::MAX) + 1);
        Self {
            bus,
            slots: (0..capacity).map(|_| None).collect(),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            auto_range: true,
        }
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.set_cooldown(secs);
        self
    }

    /// Auto-ranging default for sensors added afterwards
    pub fn with_auto_range(mut self, enabled: bool) -> Self {
        self.auto_range = enabled;
        self
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Probe `address` and register the chip found there, powered off.
    pub fn add_sensor(&mut self, address: u8) -> LumiResult<SlotId> {
        if self.slots().any(|(_, s)| s.address() == address) {
            return Err(LumiError::AlreadyRegistered(address));
        }
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(LumiError::CapacityExceeded(self.slots.len()))?;
        let id = SlotId(u8::try_from(index).map_err(|_| LumiError::CapacityExceeded(self.slots.len()))?);

        let mut driver =
            Driver::detect(&mut self.bus, address).ok_or(LumiError::UnrecognizedDevice(address))?;
        driver.init(&mut self.bus)?;
        driver.power_off(&mut self.bus)?;

        info!("Added sensor {}: {} at {:#04x}", id, driver.chip(), address);
        self.slots[index] = Some(SensorSlot::new(driver, self.auto_range));
        Ok(id)
    }

    /// Try every address in turn; returns the slots created.
    pub fn discover(&mut self, addresses: &[u8]) -> Vec<SlotId> {
        let mut added = Vec::new();
        for &address in addresses {
            match self.add_sensor(address) {
                Ok(id) => added.push(id),
                Err(LumiError::UnrecognizedDevice(_)) | Err(LumiError::AlreadyRegistered(_)) => {
                    debug!("Nothing new at {:#04x}", address);
                }
                Err(e @ LumiError::CapacityExceeded(_)) => {
                    warn!("Stopping discovery: {}", e);
                    break;
                }
                Err(e) => warn!("Failed to add sensor at {:#04x}: {}", address, e),
            }
        }
        added
    }

    /// Power the chip down and free its slot.
    pub fn remove_sensor(&mut self, id: SlotId) -> LumiResult<()> {
        let mut slot = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(LumiError::UnknownSlot(id))?;

        if let Err(e) = slot.driver_mut().power_off(&mut self.bus) {
            warn!("Error powering off sensor {}: {}", id, e);
        }
        info!("Removed sensor {}", id);
        Ok(())
    }

    pub fn slot(&self, id: SlotId) -> Option<&SensorSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: SlotId) -> LumiResult<&mut SensorSlot> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(LumiError::UnknownSlot(id))
    }

    /// Populated slots in scan order
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &SensorSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SlotId(i as u8), s)))
    }

    /// Scan every slot whose cooldown has elapsed, in index order.
    ///
    /// Failures only affect the slot they happen on.
    pub fn scan_all(&mut self, now: Instant) -> ScanReport {
        let mut report = ScanReport::default();
        let cooldown = self.cooldown;

        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(slot) = entry else { continue };

            match slot.scan(&mut self.bus, now, cooldown) {
                ScanOutcome::Skipped => {
                    report.skipped += 1;
                    continue;
                }
                ScanOutcome::Updated { lux, triggered, reranged } => {
                    report.updated += 1;
                    report.reranged += usize::from(reranged);
                    if triggered {
                        debug!("Sensor #{} [{}] new value = {}", index, slot.sub_id(), lux);
                    }
                }
                ScanOutcome::Invalid { reranged } => {
                    report.invalid += 1;
                    report.reranged += usize::from(reranged);
                    debug!("Sensor #{} [{}] sample unusable", index, slot.sub_id());
                }
                ScanOutcome::Failed(e) => {
                    report.failed += 1;
                    warn!("Read error for sensor #{} [{}]: {}", index, slot.sub_id(), e);
                }
            }
            report.scanned += 1;
        }

        report.triggered = self.trigger();
        report
    }

    /// Module-level trigger: any slot has a value waiting to be sent.
    pub fn trigger(&self) -> bool {
        self.slots().any(|(_, s)| s.trigger())
    }

    pub fn triggered(&self) -> impl Iterator<Item = TriggeredValue> + '_ {
        self.slots().filter(|(_, s)| s.trigger()).filter_map(|(id, s)| {
            s.value().map(|value| TriggeredValue {
                id,
                value,
                units: UNITS,
                sub_id: s.sub_id(),
            })
        })
    }

    pub fn for_each_triggered<F: FnMut(&TriggeredValue)>(&self, mut f: F) {
        for value in self.triggered() {
            f(&value);
        }
    }

    /// Called by the reporter once a slot's value has been delivered.
    pub fn clear_trigger(&mut self, id: SlotId) -> LumiResult<()> {
        self.slot_mut(id)?.clear_trigger();
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown.as_secs()
    }

    /// Clamp to [MIN_COOLDOWN_SECS, MAX_COOLDOWN_SECS]; returns the value applied.
    pub fn set_cooldown(&mut self, secs: u64) -> u64 {
        let applied = secs.clamp(MIN_COOLDOWN_SECS, MAX_COOLDOWN_SECS);
        if applied != secs {
            warn!("Cooldown {}s out of range, using {}s", secs, applied);
        }
        self.cooldown = Duration::from_secs(applied);
        applied
    }

    pub fn range(&self, id: SlotId) -> LumiResult<RangeSetting> {
        self.slot(id).map(|s| s.range()).ok_or(LumiError::UnknownSlot(id))
    }

    pub fn set_range(&mut self, id: SlotId, setting: RangeSetting) -> LumiResult<()> {
        let slot = self
            .slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(LumiError::UnknownSlot(id))?;
        slot.apply_range(&mut self.bus, setting)?;
        Ok(())
    }

    pub fn set_auto_range(&mut self, id: SlotId, enabled: bool) -> LumiResult<()> {
        self.slot_mut(id)?.set_auto_range(enabled);
        Ok(())
    }

    /// Refresh `snapshot` with the current state of every slot.
    pub fn fill_snapshot(&self, snapshot: &mut StatusSnapshot) {
        snapshot.value_units = UNITS.to_string();
        snapshot.cooldown_secs = self.cooldown_secs();
        snapshot.values.clear();
        snapshot.sensors.clear();

        for (id, slot) in self.slots() {
            if let Some(value) = slot.value() {
                snapshot.values.insert(slot.sub_id(), value);
            }
            snapshot.sensors.push(slot.status(id));
        }
        snapshot.updated = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::traits::{ChipKind, Gain, IntegrationTime};
    use crate::test_utils::FakeBus;

    fn two_chip_manager() -> LuminosityManager<FakeBus> {
        let mut bus = FakeBus::new();
        bus.add_tsl2561(0x39, 0x50);
        bus.add_max44009(0x4a);
        bus.set_channels(0x39, 5000, 2500);
        bus.set_lux_registers(0x4a, 0x3f, 0x0f);
        LuminosityManager::new(bus, DEFAULT_CAPACITY)
    }

    #[test]
    fn test_add_two_chip_kinds() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        let b = manager.add_sensor(0x4a).unwrap();

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.slot(a).unwrap().chip(), ChipKind::Tsl2561);
        assert_eq!(manager.slot(b).unwrap().chip(), ChipKind::Max44009);

        let report = manager.scan_all(Instant::now());
        assert_eq!(report.scanned, 2);
        assert_eq!(report.updated, 2);
        assert!(report.triggered);
        assert!(manager.slot(a).unwrap().trigger());
        assert!(manager.slot(b).unwrap().trigger());
    }

    #[test]
    fn test_added_sensor_is_powered_off() {
        let mut manager = two_chip_manager();
        manager.add_sensor(0x39).unwrap();
        assert_eq!(manager.bus().register(0x39, 0x80), Some(0x00));
    }

    #[test]
    fn test_unknown_address_is_rejected() {
        let mut manager = two_chip_manager();
        assert_eq!(manager.add_sensor(0x29), Err(LumiError::UnrecognizedDevice(0x29)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut bus = FakeBus::new();
        bus.add_tsl2561(0x39, 0x50);
        bus.add_max44009(0x4a);
        let mut manager = LuminosityManager::new(bus, 1);

        manager.add_sensor(0x39).unwrap();
        assert_eq!(manager.add_sensor(0x4a), Err(LumiError::CapacityExceeded(1)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_same_address_twice() {
        let mut manager = two_chip_manager();
        manager.add_sensor(0x39).unwrap();
        assert_eq!(manager.add_sensor(0x39), Err(LumiError::AlreadyRegistered(0x39)));
    }

    #[test]
    fn test_cooldown_skips_recent_slots() {
        let mut manager = two_chip_manager().with_cooldown(60);
        manager.add_sensor(0x39).unwrap();

        let t0 = Instant::now();
        manager.scan_all(t0);
        assert_eq!(manager.bus().acquisitions(0x39), 1);

        let report = manager.scan_all(t0 + Duration::from_secs(10));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.scanned, 0);
        assert_eq!(manager.bus().acquisitions(0x39), 1);

        manager.scan_all(t0 + Duration::from_secs(60));
        assert_eq!(manager.bus().acquisitions(0x39), 2);
    }

    #[test]
    fn test_failing_slot_does_not_stop_scan() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        let b = manager.add_sensor(0x4a).unwrap();
        manager.bus_mut().fail_address(0x39);

        let report = manager.scan_all(Instant::now());
        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
        assert!(!manager.slot(a).unwrap().trigger());
        assert!(manager.slot(b).unwrap().trigger());
    }

    #[test]
    fn test_saturated_scan_requests_lower_sensitivity() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        manager.bus_mut().set_channels(0x39, u16::MAX, 100);

        let report = manager.scan_all(Instant::now());
        assert_eq!(report.invalid, 1);
        assert_eq!(report.reranged, 1);
        assert!(!report.triggered);
        assert_eq!(
            manager.range(a).unwrap(),
            RangeSetting::new(Gain::Low, IntegrationTime::Long)
        );
    }

    #[test]
    fn test_triggered_values_and_clear() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        manager.scan_all(Instant::now());

        let mut seen = Vec::new();
        manager.for_each_triggered(|v| seen.push(v.clone()));
        assert_eq!(
            seen,
            vec![TriggeredValue { id: a, value: 34.0, units: "lux", sub_id: "57".to_string() }]
        );

        manager.clear_trigger(a).unwrap();
        assert!(!manager.trigger());
        assert_eq!(manager.triggered().count(), 0);
        assert_eq!(manager.clear_trigger(SlotId(3)), Err(LumiError::UnknownSlot(SlotId(3))));
    }

    #[test]
    fn test_remove_frees_index() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        manager.add_sensor(0x4a).unwrap();

        manager.remove_sensor(a).unwrap();
        assert_eq!(manager.len(), 1);
        assert!(manager.slot(a).is_none());
        assert_eq!(manager.remove_sensor(a), Err(LumiError::UnknownSlot(a)));

        // freed index is reused
        assert_eq!(manager.add_sensor(0x39).unwrap(), a);
    }

    #[test]
    fn test_cooldown_bounds() {
        let mut manager = two_chip_manager();
        assert_eq!(manager.cooldown_secs(), DEFAULT_COOLDOWN_SECS);
        assert_eq!(manager.set_cooldown(1), MIN_COOLDOWN_SECS);
        assert_eq!(manager.set_cooldown(100_000), MAX_COOLDOWN_SECS);
        assert_eq!(manager.set_cooldown(120), 120);
        assert_eq!(manager.cooldown(), Duration::from_secs(120));
    }

    #[test]
    fn test_range_round_trip() {
        let mut manager = two_chip_manager();
        let a = manager.add_sensor(0x39).unwrap();
        let setting = RangeSetting::new(Gain::Low, IntegrationTime::Medium);

        manager.set_range(a, setting).unwrap();
        assert_eq!(manager.range(a).unwrap(), setting);
    }

    #[test]
    fn test_discover_known_addresses() {
        let mut manager = two_chip_manager();
        let added = manager.discover(&crate::sensors::known_addresses());
        assert_eq!(added.len(), 2);

        // second pass finds nothing new
        assert!(manager.discover(&crate::sensors::known_addresses()).is_empty());
    }

    #[test]
    fn test_snapshot_lists_values() {
        let mut manager = two_chip_manager();
        manager.add_sensor(0x39).unwrap();
        manager.add_sensor(0x4a).unwrap();
        manager.scan_all(Instant::now());

        let mut snapshot = StatusSnapshot::default();
        manager.fill_snapshot(&mut snapshot);
        assert_eq!(snapshot.value_units, "lux");
        assert_eq!(snapshot.cooldown_secs, DEFAULT_COOLDOWN_SECS);
        assert_eq!(snapshot.sensors.len(), 2);
        assert_eq!(snapshot.values.get("57"), Some(&34.0));
        assert!(snapshot.values.contains_key("74"));
        assert!(snapshot.updated.is_some());
    }
}
