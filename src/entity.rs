//! The entity aggregate: mutable state derived exclusively from its event
//! history. Nothing here mutates state directly; every mutator constructs an
//! event and hands it to the replay path.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EntityError;
use crate::event::{EntityEvent, EventPayload};
use crate::schema::{blank_attributes, blank_roles, pascal_case, AttributeKind, EntityType};
use crate::store::Snapshot;
use crate::value::{Value, NULL};
use crate::Version;

/// An aggregate whose visible state is produced only by replaying its events
/// in order.
///
/// The attribute member set is fixed by the entity type; the version counts
/// one increment per applied event and is the optimistic-concurrency token
/// the store boundary compares at commit time.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) entity_type: Arc<EntityType>,
    pub(crate) id: Uuid,
    pub(crate) version: Version,
    pub(crate) created: Option<DateTime<Utc>>,
    pub(crate) last_modified: Option<DateTime<Utc>>,
    pub(crate) deleted: bool,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) roles: BTreeMap<String, Vec<Uuid>>,
    pub(crate) uncommitted: Vec<EntityEvent>,
}

impl Entity {
    /// A fresh entity with no history: every declared attribute unset, every
    /// declared role empty, version 0.
    pub(crate) fn blank(entity_type: Arc<EntityType>, id: Uuid) -> Self {
        let attributes = blank_attributes(&entity_type);
        let roles = blank_roles(&entity_type);

        Self {
            entity_type,
            id,
            version: 0,
            created: None,
            last_modified: None,
            deleted: false,
            attributes,
            roles,
            uncommitted: Vec::new(),
        }
    }

    /// Creates a new entity instance: one initial event, then one setter or
    /// generic event per supplied initial field.
    pub fn create(
        entity_type: Arc<EntityType>,
        by: Uuid,
        at: DateTime<Utc>,
        initial: BTreeMap<String, Value>,
    ) -> Result<Self, EntityError> {
        let mut entity = Self::blank(entity_type, Uuid::new_v4());

        let created = EntityEvent::new(entity.entity_type.name(), Some(by), at, EventPayload::Created);
        entity.record(created)?;
        entity.update(by, at, initial)?;

        Ok(entity)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Events applied since this instance was created or loaded, not yet
    /// confirmed durable by the store.
    pub fn uncommitted_events(&self) -> &[EntityEvent] {
        &self.uncommitted
    }

    /// Acknowledges durability: called by the store boundary once every
    /// uncommitted event has been persisted.
    pub fn mark_committed(&mut self) {
        self.uncommitted.clear();
    }

    /// Reads an attribute, with the kind-specific defaults applied: boolean
    /// attributes fall back to their declared default when unset, symbol
    /// arrays read as the empty list.
    pub fn get(&self, name: &str) -> Result<Value, EntityError> {
        let spec = self
            .entity_type
            .attribute(name)
            .ok_or_else(|| EntityError::UnrecognizedAttribute(name.to_owned()))?;

        Ok(spec.read_value(self.raw(name)))
    }

    /// Predicate accessor for boolean attributes.
    pub fn flag(&self, name: &str) -> Result<bool, EntityError> {
        let spec = self
            .entity_type
            .attribute(name)
            .ok_or_else(|| EntityError::UnrecognizedAttribute(name.to_owned()))?;

        if spec.kind() != AttributeKind::Boolean {
            return Err(EntityError::InvalidValue {
                attribute: name.to_owned(),
                expected: "a boolean attribute",
            });
        }

        Ok(spec.read_value(self.raw(name)).is_truthy())
    }

    pub(crate) fn raw(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    /// Sets one attribute through its dedicated setter event.
    ///
    /// No event is recorded and no state changes when the coerced value
    /// equals the attribute's current value. Attributes without a dedicated
    /// setter (symbol maps) are changed through [`Entity::update`] instead.
    pub fn set_attribute(&mut self, by: Uuid, at: DateTime<Utc>, name: &str, value: Value) -> Result<(), EntityError> {
        let entity_type = Arc::clone(&self.entity_type);
        let spec = entity_type
            .attribute(name)
            .ok_or_else(|| EntityError::UnrecognizedAttribute(name.to_owned()))?;

        if !spec.has_set_event() {
            return Err(EntityError::NoSetter(name.to_owned()));
        }

        let coerced = spec.kind().coerce(name, value)?;
        if coerced == spec.read_value(self.raw(name)) {
            return Ok(());
        }

        let event = EntityEvent::new(
            entity_type.name(),
            Some(by),
            at,
            EventPayload::AttributeSet {
                name: name.to_owned(),
                value: coerced,
            },
        );
        self.record(event)
    }

    /// Marks the entity deleted. The flag is never reverted by any later
    /// event.
    pub fn delete(&mut self, by: Uuid, at: DateTime<Utc>) -> Result<(), EntityError> {
        let event = EntityEvent::new(self.entity_type.name(), Some(by), at, EventPayload::Deleted);
        self.record(event)
    }

    /// Materializes the current state for the store boundary.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entity_type: self.entity_type.name().to_owned(),
            id: self.id,
            version: self.version,
            created: self.created,
            last_modified: self.last_modified,
            deleted: self.deleted,
            attributes: self.attributes.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Basic equality contract: two entities are the same when identifier and
/// version match, never by deep structural comparison.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        (self.id, self.version) == (other.id, other.version)
    }
}

impl Eq for Entity {}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{} id={}>", pascal_case(self.entity_type.name()), self.id)
    }
}
