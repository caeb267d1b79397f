// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Engine - couples the luminosity manager to a reporter

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::EngineStats;
use crate::config::Config;
use crate::sensors::{LuminosityManager, RegisterBus, ScanReport, SlotId, StatusSnapshot};
use crate::streaming::{Order, Reporter, ValueMessage};

/// Owns the manager and decides what gets published and when
pub struct Engine<B: RegisterBus> {
    manager: LuminosityManager<B>,
    reporter: Box<dyn Reporter>,
    config: Config,
    config_path: Option<PathBuf>,
    snapshot: StatusSnapshot,
    last_published: HashMap<SlotId, Instant>,
    stats: EngineStats,
}

impl<B: RegisterBus> Engine<B> {
    pub fn new(manager: LuminosityManager<B>, reporter: Box<dyn Reporter>, config: Config) -> Self {
        let mut snapshot = StatusSnapshot::default();
        manager.fill_snapshot(&mut snapshot);
        Self {
            manager,
            reporter,
            config,
            config_path: None,
            snapshot,
            last_published: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    /// Where a changed cooldown gets persisted
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn manager(&self) -> &LuminosityManager<B> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut LuminosityManager<B> {
        &mut self.manager
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One synchronous scan pass; blocks while chips integrate.
    pub fn scan(&mut self, now: Instant) -> ScanReport {
        let report = self.manager.scan_all(now);
        self.manager.fill_snapshot(&mut self.snapshot);

        self.stats.scans += 1;
        if report.scanned > 0 {
            self.stats.last_scan = Some(Utc::now());
            debug!(
                "Scan: {} scanned, {} updated, {} invalid, {} failed, {} reranged",
                report.scanned, report.updated, report.invalid, report.failed, report.reranged
            );
        }
        report
    }

    /// Publish triggered values plus any value not sent for `resend_max_age_secs`.
    ///
    /// Only slots whose last reading is valid are resent, so a failed or
    /// saturated sensor stops repeating its old value. Stops at the first
    /// failed publication; triggers of unsent values stay set.
    pub async fn report(&mut self, now: Instant) -> Result<usize> {
        let max_age = Duration::from_secs(self.config.streaming.resend_max_age_secs);
        let pending: Vec<(SlotId, ValueMessage)> = self
            .manager
            .slots()
            .filter_map(|(id, slot)| {
                let value = slot.value()?;
                let reading_valid = slot.last_result().map_or(false, |r| r.valid);
                let stale = reading_valid
                    && self
                        .last_published
                        .get(&id)
                        .map_or(false, |sent| now.saturating_duration_since(*sent) >= max_age);
                (slot.trigger() || stale).then(|| (id, ValueMessage::lux(value, slot.sub_id())))
            })
            .collect();

        self.publish_all(pending, now).await
    }

    /// Execute an order received on the command topic.
    ///
    /// `Acquire` publishes every slot whose last reading is valid, changed or
    /// not, instead of only the triggered ones.
    pub async fn handle_order(&mut self, order: Order, now: Instant) -> Result<()> {
        info!("Processing order {:?}", order);
        match order {
            Order::Status => self.publish_status().await,
            Order::Acquire => {
                let pending: Vec<(SlotId, ValueMessage)> = self
                    .manager
                    .slots()
                    .filter(|(_, slot)| slot.last_result().map_or(false, |r| r.valid))
                    .filter_map(|(id, slot)| {
                        slot.value().map(|v| (id, ValueMessage::lux(v, slot.sub_id())))
                    })
                    .collect();
                self.publish_all(pending, now).await.map(|_| ())
            }
            Order::Frequency(secs) => {
                let applied = self.manager.set_cooldown(u64::try_from(secs).unwrap_or(0));
                self.config.sensors.cooldown_secs = applied;
                self.publish_status().await?;

                if let Some(path) = &self.config_path {
                    self.config.save(path)?;
                }
                Ok(())
            }
        }
    }

    /// Power every sensor off and close the reporter.
    pub async fn shutdown(&mut self) -> Result<()> {
        let ids: Vec<SlotId> = self.manager.slots().map(|(id, _)| id).collect();
        for id in ids {
            if let Err(e) = self.manager.remove_sensor(id) {
                warn!("Error releasing sensor {}: {}", id, e);
            }
        }
        self.reporter.shutdown().await
    }

    async fn publish_status(&mut self) -> Result<()> {
        self.manager.fill_snapshot(&mut self.snapshot);
        self.reporter.publish_status(&self.snapshot).await
    }

    async fn publish_all(&mut self, pending: Vec<(SlotId, ValueMessage)>, now: Instant) -> Result<usize> {
        let gap = Duration::from_millis(self.config.streaming.publish_gap_ms);
        let mut sent = 0;

        for (id, message) in pending {
            if sent > 0 && !gap.is_zero() {
                tokio::time::sleep(gap).await;
            }
            if let Err(e) = self.reporter.publish_value(&message).await {
                warn!("Publishing sensor {} failed, {} value(s) sent: {}", id, sent, e);
                self.stats.failed_publishes += 1;
                return Err(e);
            }
            self.manager.clear_trigger(id)?;
            self.last_published.insert(id, now);
            self.stats.published += 1;
            sent += 1;
        }
        Ok(sent)
    }
}
