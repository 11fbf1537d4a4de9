//! Process-local OTP repository
//!
//! Suitable for single-instance deployments and tests. All state lives behind
//! one mutex, so each operation is a single critical section.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpRecord};
use crate::errors::DomainError;

use super::trait_::{AttemptSlot, OtpRepository};

/// Key count above which `issue` sweeps every key, not just its own
pub(crate) const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Default)]
struct KeySlot {
    generation: u64,
    records: Vec<OtpRecord>,
}

impl KeySlot {
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.records.retain(|r| !r.is_expired_at(now));
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut OtpRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }
}

/// In-memory OTP repository
pub struct InMemoryOtpRepository {
    slots: Mutex<HashMap<OtpKey, KeySlot>>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every expired record, and keys left with no records.
    ///
    /// Operations already purge the key they touch; this sweeps the rest.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut slots = self.slots.lock().await;
        sweep(&mut slots, now)
    }

    /// Number of keys currently holding records
    pub async fn key_count(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// All records held for `key`, newest last. Test helper.
    pub async fn records_for(&self, key: &OtpKey) -> Vec<OtpRecord> {
        let slots = self.slots.lock().await;
        slots
            .get(key)
            .map(|slot| slot.records.clone())
            .unwrap_or_default()
    }
}

fn sweep(slots: &mut HashMap<OtpKey, KeySlot>, now: DateTime<Utc>) -> usize {
    let before: usize = slots.values().map(|s| s.records.len()).sum();
    slots.retain(|_, slot| {
        slot.purge_expired(now);
        !slot.records.is_empty()
    });
    let after: usize = slots.values().map(|s| s.records.len()).sum();
    before - after
}

impl Default for InMemoryOtpRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn issue(&self, record: &OtpRecord) -> Result<u64, DomainError> {
        let mut slots = self.slots.lock().await;
        if slots.len() > SWEEP_THRESHOLD {
            let purged = sweep(&mut slots, record.created_at);
            tracing::debug!(purged, keys = slots.len(), "Swept expired OTP records");
        }

        let slot = slots.entry(record.key()).or_default();

        slot.purge_expired(record.created_at);
        for previous in slot.records.iter_mut().filter(|r| !r.is_used) {
            previous.mark_used();
        }

        slot.generation += 1;
        let mut stored = record.clone();
        stored.generation = slot.generation;
        slot.records.push(stored);

        Ok(slot.generation)
    }

    async fn find_active(
        &self,
        key: &OtpKey,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(key) else {
            return Ok(None);
        };

        slot.purge_expired(now);
        if slot.records.is_empty() {
            slots.remove(key);
            return Ok(None);
        }
        Ok(slot
            .records
            .iter()
            .rev()
            .find(|r| r.is_active_at(now))
            .cloned())
    }

    async fn consume_attempt(
        &self,
        key: &OtpKey,
        id: Uuid,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, DomainError> {
        let mut slots = self.slots.lock().await;
        let Some(record) = slots.get_mut(key).and_then(|slot| slot.get_mut(id)) else {
            return Ok(AttemptSlot::Gone);
        };

        if !record.is_active_at(now) {
            return Ok(AttemptSlot::Gone);
        }
        if record.attempts >= max_attempts {
            return Ok(AttemptSlot::Exhausted);
        }

        record.attempts += 1;
        Ok(AttemptSlot::Granted {
            attempts: record.attempts,
        })
    }

    async fn mark_used(&self, key: &OtpKey, id: Uuid) -> Result<bool, DomainError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(key).and_then(|slot| slot.get_mut(id)) {
            Some(record) if !record.is_used => {
                record.mark_used();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
