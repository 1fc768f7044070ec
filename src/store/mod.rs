//! The boundary with the durable store.
//!
//! The core never performs I/O itself; a store implementation supplies an
//! entity's snapshot and ordered event history, appends uncommitted events
//! under an optimistic version check, and records snapshots. Serialization
//! of events and snapshots is the store's concern; the serde derives on
//! [`crate::EntityEvent`], [`crate::Value`], and [`Snapshot`] exist for it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ReplayError;
use crate::event::EntityEvent;
use crate::value::Value;
use crate::Version;

mod memory;

pub use self::memory::InMemoryStore;

/// A materialized entity state at some version, used to avoid full replay
/// from the beginning of history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entity_type: String,
    pub id: Uuid,
    pub version: Version,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub attributes: BTreeMap<String, Value>,
    pub roles: BTreeMap<String, Vec<Uuid>>,
}

/// An event decorated with the metadata the store assigned when it was
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Uniquely identifies the event among all events from all entities.
    pub id: Uuid,
    /// The entity instance the event belongs to.
    pub entity_id: Uuid,
    /// The entity version this event produced when first applied.
    pub version: Version,
    /// The event itself.
    pub event: EntityEvent,
}

/// What a store hands back for one entity: the most recent snapshot, if one
/// exists, and the events recorded after it in the exact order they were
/// originally applied.
#[derive(Debug, Default)]
pub struct EventStream {
    pub snapshot: Option<Snapshot>,
    pub events: Vec<StoredEvent>,
}

impl EventStream {
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none() && self.events.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity changed between load and commit; reload and retry.
    #[error("version conflict for entity {id}: expected {expected}, store at {actual}")]
    VersionConflict {
        id: Uuid,
        expected: Version,
        actual: Version,
    },
    /// Serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Persisted history could not be replayed; not retryable.
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// A durable store for entity events and snapshots.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Loads the most recent snapshot, if any, and the events recorded after
    /// it. An id the store has never seen yields an empty stream.
    async fn load(&self, id: Uuid) -> Result<EventStream, StoreError>;

    /// Loads the full event history from the beginning, ignoring snapshots.
    async fn history(&self, id: Uuid) -> Result<Vec<StoredEvent>, StoreError>;

    /// Appends events to the entity's history. Fails with
    /// [`StoreError::VersionConflict`] unless `expected_version` matches the
    /// store's current version for the entity; either every event is
    /// persisted or none are.
    async fn append(
        &self,
        id: Uuid,
        expected_version: Version,
        events: &[EntityEvent],
    ) -> Result<Vec<StoredEvent>, StoreError>;

    /// Records a snapshot, replacing any previous one for the entity.
    async fn record_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError>;
}
