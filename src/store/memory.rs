//! An in-memory [`EntityStore`], suitable for tests and embedding.
//!
//! Events are held serialized, the way a relational store would hold them,
//! so the round trip through the event's serde representation is exercised
//! on every load.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::event::EntityEvent;
use crate::store::{EntityStore, EventStream, Snapshot, StoreError, StoredEvent};
use crate::Version;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    logs: HashMap<Uuid, Vec<LogEntry>>,
    snapshots: HashMap<Uuid, serde_json::Value>,
}

#[derive(Debug)]
struct LogEntry {
    id: Uuid,
    version: Version,
    payload: serde_json::Value,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogEntry {
    fn to_stored(&self, entity_id: Uuid) -> Result<StoredEvent, StoreError> {
        let event: EntityEvent = serde_json::from_value(self.payload.clone())?;
        Ok(StoredEvent {
            id: self.id,
            entity_id,
            version: self.version,
            event,
        })
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn load(&self, id: Uuid) -> Result<EventStream, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        let snapshot: Option<Snapshot> = match inner.snapshots.get(&id) {
            Some(value) => Some(serde_json::from_value(value.clone())?),
            None => None,
        };
        let after = snapshot.as_ref().map(|s| s.version).unwrap_or(0);

        let events = match inner.logs.get(&id) {
            Some(log) => log
                .iter()
                .filter(|entry| entry.version > after)
                .map(|entry| entry.to_stored(id))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(EventStream { snapshot, events })
    }

    async fn history(&self, id: Uuid) -> Result<Vec<StoredEvent>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        match inner.logs.get(&id) {
            Some(log) => log.iter().map(|entry| entry.to_stored(id)).collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn append(
        &self,
        id: Uuid,
        expected_version: Version,
        events: &[EntityEvent],
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let log = inner.logs.entry(id).or_insert_with(Vec::new);
        let actual = log.last().map(|entry| entry.version).unwrap_or(0);
        if expected_version != actual {
            return Err(StoreError::VersionConflict {
                id,
                expected: expected_version,
                actual,
            });
        }

        // Serialize everything before touching the log so a failure
        // persists nothing.
        let mut entries = Vec::with_capacity(events.len());
        for (offset, event) in events.iter().enumerate() {
            entries.push(LogEntry {
                id: Uuid::new_v4(),
                version: expected_version + offset as Version + 1,
                payload: serde_json::to_value(event)?,
            });
        }

        tracing::debug!(entity_id = %id, count = events.len(), "appending events");

        let mut stored = Vec::with_capacity(entries.len());
        for entry in &entries {
            stored.push(entry.to_stored(id)?);
        }
        log.extend(entries);

        Ok(stored)
    }

    async fn record_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let id = snapshot.id;
        let value = serde_json::to_value(&snapshot)?;

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.snapshots.insert(id, value);

        Ok(())
    }
}
