//! The replay engine: deterministically folds one event, or an ordered
//! sequence, into an entity.

use std::sync::Arc;

use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{EntityError, ReplayError};
use crate::event::EntityEvent;
use crate::schema::EntityType;
use crate::store::Snapshot;

impl Entity {
    /// Steps shared by recording and rehydration: dispatch to the kind's own
    /// apply rule, maintain the derived timestamps, bump the version.
    pub(crate) fn fold(&mut self, event: &EntityEvent) -> Result<(), ReplayError> {
        let expected_tag = event.payload().type_tag(self.entity_type.name());
        if event.type_tag() != expected_tag {
            return Err(ReplayError::UnknownEventKind {
                entity_type: self.entity_type.name().to_owned(),
                type_tag: event.type_tag().to_owned(),
            });
        }

        event.payload().apply(self)?;

        if let Some(at) = event.at() {
            if self.last_modified.is_none() {
                // The only place created is ever set. A snapshot carrying
                // last_modified but no created cannot be patched here; it
                // has to be invalidated so the entity replays from the
                // beginning of history.
                self.created = Some(at);
            }
            self.last_modified = Some(at);
        }

        self.version += 1;
        Ok(())
    }

    /// Applies a freshly constructed event and queues it for durable
    /// storage. Either the event is fully applied, queued, and counted, or
    /// nothing changed.
    pub(crate) fn record(&mut self, event: EntityEvent) -> Result<(), EntityError> {
        self.fold(&event)?;
        self.uncommitted.push(event);
        Ok(())
    }
}

/// Reconstructs an entity by left-folding the ordered event sequence onto an
/// empty entity or onto the given snapshot.
///
/// Replayed history is already durable, so it does not enter the entity's
/// uncommitted list; the version still counts every applied event. An event
/// whose kind was never generated for this entity type aborts the whole
/// reconstruction.
pub fn replay(
    entity_type: Arc<EntityType>,
    id: Uuid,
    snapshot: Option<Snapshot>,
    events: Vec<EntityEvent>,
) -> Result<Entity, ReplayError> {
    let mut entity = match snapshot {
        Some(snapshot) => from_snapshot(entity_type, snapshot)?,
        None => Entity::blank(entity_type, id),
    };

    for event in &events {
        entity.fold(event)?;
    }

    Ok(entity)
}

fn from_snapshot(entity_type: Arc<EntityType>, snapshot: Snapshot) -> Result<Entity, ReplayError> {
    if snapshot.entity_type != entity_type.name() {
        return Err(ReplayError::SnapshotMismatch {
            expected: entity_type.name().to_owned(),
            found: snapshot.entity_type,
        });
    }

    let mut entity = Entity::blank(entity_type, snapshot.id);

    for (name, value) in snapshot.attributes {
        if entity.entity_type.attribute(&name).is_none() {
            return Err(ReplayError::UnknownSnapshotField(name));
        }
        entity.attributes.insert(name, value);
    }

    for (role, members) in snapshot.roles {
        if !entity.entity_type.has_role(&role) {
            return Err(ReplayError::UnknownSnapshotField(role));
        }
        entity.roles.insert(role, members);
    }

    entity.version = snapshot.version;
    entity.created = snapshot.created;
    entity.last_modified = snapshot.last_modified;
    entity.deleted = snapshot.deleted;

    Ok(entity)
}
