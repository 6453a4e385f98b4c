//! History Manager for charrank.
//!
//! Owns the ranking history: a FIFO-bounded list of snapshots persisted
//! through a [`KeyValueStore`]. The full list is written after every
//! mutation, and the in-memory list only changes once that write succeeded.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::database::KeyValueStore;
use crate::types::character::CharacterRecord;
use crate::types::errors::HistoryError;
use crate::types::history::HistoryRecord;
use crate::types::settings::HistorySettings;

/// Storage key of the persisted history list.
pub const HISTORY_KEY: &str = "rankingHistory";

/// Trait defining ranking history operations.
pub trait HistoryManagerTrait {
    fn append(&mut self, snapshot: Vec<CharacterRecord>) -> Result<HistoryRecord, HistoryError>;
    fn append_at(
        &mut self,
        snapshot: Vec<CharacterRecord>,
        timestamp: &str,
    ) -> Result<HistoryRecord, HistoryError>;
    fn delete(&mut self, timestamp: &str) -> Result<bool, HistoryError>;
    fn clear(&mut self) -> Result<(), HistoryError>;
    fn list(&self) -> Vec<&HistoryRecord>;
    fn get(&self, timestamp: &str) -> Option<&HistoryRecord>;
    fn latest(&self) -> Option<&HistoryRecord>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// History store backed by an injected key-value store.
pub struct HistoryManager {
    store: Arc<dyn KeyValueStore>,
    records: Vec<HistoryRecord>,
    capacity: usize,
}

impl HistoryManager {
    /// Hydrates the history from `store`. An absent key yields an empty history.
    ///
    /// A persisted list longer than `capacity` is trimmed in memory; the store
    /// catches up on the next mutation.
    pub fn load(store: Arc<dyn KeyValueStore>, capacity: usize) -> Result<Self, HistoryError> {
        let capacity = capacity.max(1);
        let mut records: Vec<HistoryRecord> = match store.get(HISTORY_KEY)? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| HistoryError::Corrupt(e.to_string()))?,
            None => Vec::new(),
        };
        Self::trim(&mut records, capacity);
        debug!(count = records.len(), capacity, "Ranking history loaded");

        Ok(Self {
            store,
            records,
            capacity,
        })
    }

    /// Creates an empty history with the default capacity.
    pub fn with_default_capacity(store: Arc<dyn KeyValueStore>) -> Result<Self, HistoryError> {
        Self::load(store, HistorySettings::DEFAULT_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity; shrinking evicts the oldest records and persists.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), HistoryError> {
        let capacity = capacity.max(1);
        if self.records.len() > capacity {
            let mut next = self.records.clone();
            Self::trim(&mut next, capacity);
            self.commit(next)?;
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Timestamp for a new record: the current UTC time as RFC 3339 with
    /// millisecond precision, moved 1 ms past the newest stored stamp when
    /// the clock has not advanced beyond it. Timestamps are record keys.
    fn next_timestamp(&self) -> String {
        let now = Utc::now();
        let newest = self
            .records
            .iter()
            .filter_map(|r| DateTime::parse_from_rfc3339(&r.timestamp).ok())
            .map(|t| t.timestamp_millis())
            .max();

        let stamp = match newest {
            Some(newest) if newest >= now.timestamp_millis() => Utc
                .timestamp_millis_opt(newest + 1)
                .single()
                .unwrap_or(now),
            _ => now,
        };
        stamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn trim(records: &mut Vec<HistoryRecord>, capacity: usize) {
        if records.len() > capacity {
            let excess = records.len() - capacity;
            records.drain(..excess);
        }
    }

    /// Persists `next` and, on success, makes it the in-memory list.
    fn commit(&mut self, next: Vec<HistoryRecord>) -> Result<(), HistoryError> {
        let value = serde_json::to_value(&next)?;
        self.store.set(HISTORY_KEY, &value)?;
        self.records = next;
        Ok(())
    }
}

impl HistoryManagerTrait for HistoryManager {
    /// Appends a snapshot stamped with the current time, unique within the history.
    fn append(&mut self, snapshot: Vec<CharacterRecord>) -> Result<HistoryRecord, HistoryError> {
        let timestamp = self.next_timestamp();
        self.append_at(snapshot, &timestamp)
    }

    /// Appends a snapshot with an explicit timestamp, evicting the oldest
    /// records beyond capacity.
    fn append_at(
        &mut self,
        snapshot: Vec<CharacterRecord>,
        timestamp: &str,
    ) -> Result<HistoryRecord, HistoryError> {
        let record = HistoryRecord {
            timestamp: timestamp.to_string(),
            data: snapshot,
        };

        let mut next = self.records.clone();
        next.push(record.clone());
        let before = next.len();
        Self::trim(&mut next, self.capacity);
        self.commit(next)?;

        info!(
            timestamp = %record.timestamp,
            characters = record.data.len(),
            evicted = before - self.records.len(),
            "Ranking snapshot saved"
        );
        Ok(record)
    }

    /// Removes the record(s) with exactly this timestamp.
    /// Returns `false` without touching storage when nothing matches.
    fn delete(&mut self, timestamp: &str) -> Result<bool, HistoryError> {
        if !self.records.iter().any(|r| r.timestamp == timestamp) {
            return Ok(false);
        }
        let next: Vec<HistoryRecord> = self
            .records
            .iter()
            .filter(|r| r.timestamp != timestamp)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.store.set(HISTORY_KEY, &Value::Array(Vec::new()))?;
        self.records.clear();
        Ok(())
    }

    /// Most-recent-first view of the history.
    fn list(&self) -> Vec<&HistoryRecord> {
        self.records.iter().rev().collect()
    }

    fn get(&self, timestamp: &str) -> Option<&HistoryRecord> {
        self.records.iter().rev().find(|r| r.timestamp == timestamp)
    }

    fn latest(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
