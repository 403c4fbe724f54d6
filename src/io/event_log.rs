//! Circular history of floodlight on/off events.
//!
//! Holds at most [`MAX_LOG_ENTRIES`] entries; the oldest is overwritten once
//! full. Index 0 is always the most recent event. Timestamps are Unix seconds
//! derived from the injected clock and the epoch it was created at, so a
//! simulated run produces a reproducible history.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::VecDeque;

use super::EventSink;
use crate::constants::{LOG_RETENTION_DAYS, MAX_LOG_ENTRIES, MAX_MODE_LEN};
use crate::decision::LightEvent;
use crate::time_source::{Clock, SystemClock, elapsed_ms};

const SECONDS_PER_HOUR: u64 = 3600;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    pub on: bool,
    pub lux: f32,
    pub moving: bool,
    pub mode: String,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    timestamp: u64,
    event: &'static str,
    lux: f64,
    motion: bool,
    mode: &'a str,
}

#[derive(Serialize)]
struct JsonLog<'a> {
    logs: Vec<JsonEntry<'a>>,
    total: usize,
}

pub struct EventLog {
    entries: VecDeque<LogEntry>,
    clock: Box<dyn Clock>,
    epoch_secs: u64,
    // Monotonic milliseconds accumulated across counter wraps.
    elapsed: Cell<u64>,
    last_millis: Cell<u32>,
}

impl EventLog {
    /// A log whose clock reading at creation corresponds to `epoch_secs`.
    pub fn new(clock: Box<dyn Clock>, epoch_secs: u64) -> Self {
        let last = clock.now_millis();
        Self {
            entries: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            clock,
            epoch_secs,
            elapsed: Cell::new(0),
            last_millis: Cell::new(last),
        }
    }

    /// A log stamped with real Unix time.
    pub fn system() -> Self {
        let epoch = chrono::Utc::now().timestamp().max(0) as u64;
        Self::new(Box::new(SystemClock::new()), epoch)
    }

    /// Current Unix time as seen by this log.
    pub fn now_secs(&self) -> u64 {
        let now = self.clock.now_millis();
        let delta = elapsed_ms(now, self.last_millis.get());
        self.last_millis.set(now);
        self.elapsed.set(self.elapsed.get() + u64::from(delta));
        self.epoch_secs + self.elapsed.get() / 1000
    }

    /// Append an event stamped with the current time.
    pub fn record(&mut self, on: bool, lux: f32, moving: bool, mode: &str) {
        let timestamp = self.now_secs();
        let mode: String = mode.chars().take(MAX_MODE_LEN).collect();

        log_debug!(
            "Event logged: {} | Lux: {lux:.1} | Motion: {} | Mode: {mode}",
            if on { "LIGHT ON" } else { "LIGHT OFF" },
            if moving { "YES" } else { "NO" }
        );

        self.entries.push_front(LogEntry {
            timestamp,
            on,
            lux,
            moving,
            mode,
        });
        self.entries.truncate(MAX_LOG_ENTRIES);
    }

    /// Event at `index`, 0 being the newest.
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Events from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        log_debug!("All events cleared");
    }

    /// Number of events in the last `hours` hours.
    pub fn count_last_hours(&self, hours: u32) -> usize {
        let cutoff = self
            .now_secs()
            .saturating_sub(u64::from(hours) * SECONDS_PER_HOUR);
        self.entries
            .iter()
            .take_while(|entry| entry.timestamp >= cutoff)
            .count()
    }

    /// Drop events older than the retention period; returns how many went.
    pub fn purge_expired(&mut self) -> usize {
        let retention = u64::from(LOG_RETENTION_DAYS) * 24 * SECONDS_PER_HOUR;
        let cutoff = self.now_secs().saturating_sub(retention);
        let before = self.entries.len();
        while self
            .entries
            .back()
            .is_some_and(|entry| entry.timestamp < cutoff)
        {
            self.entries.pop_back();
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            log_debug!("Cleaned {removed} old events");
        }
        removed
    }

    /// Serialize as `{"logs":[...],"total":n}`, newest first.
    pub fn to_json(&self) -> Result<String> {
        let logs = self
            .entries
            .iter()
            .map(|entry| JsonEntry {
                timestamp: entry.timestamp,
                event: if entry.on { "on" } else { "off" },
                lux: (f64::from(entry.lux) * 10.0).round() / 10.0,
                motion: entry.moving,
                mode: &entry.mode,
            })
            .collect();
        let log = JsonLog {
            logs,
            total: self.entries.len(),
        };
        serde_json::to_string(&log).context("Failed to serialize event log")
    }
}

impl EventSink for EventLog {
    fn log_event(&mut self, event: LightEvent) {
        self.record(event.on, event.lux, event.moving, event.mode.as_str());
    }
}
