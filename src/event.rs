//! Events: immutable, attributed facts, one concrete kind per attribute
//! action plus the generic kinds. Each kind owns its apply rule; everything
//! else about folding an event into an entity lives in [`crate::replay`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{EntityError, ReplayError};
use crate::schema::{pascal_case, EntityType};
use crate::value::Value;

/// An immutable event: who, when, and a typed payload. The type tag is
/// derived once, at construction, from the entity type name and the payload
/// kind; stores use it to discriminate serialized events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    type_tag: String,
    by: Option<Uuid>,
    at: Option<DateTime<Utc>>,
    payload: EventPayload,
}

impl EntityEvent {
    pub(crate) fn new(entity_type: &str, by: Option<Uuid>, at: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            type_tag: payload.type_tag(entity_type),
            by,
            at: Some(at),
            payload,
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn by(&self) -> Option<Uuid> {
        self.by
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        self.at
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

/// The concrete event kinds an entity type generates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Created,
    AttributeSet {
        name: String,
        value: Value,
    },
    AttributesUpdated {
        attrs: BTreeMap<String, Value>,
    },
    Deleted,
    RoleAdded {
        role: String,
        member: Uuid,
    },
    RoleRemoved {
        role: String,
        member: Uuid,
    },
    AllRolesRemoved,
}

impl EventPayload {
    /// Derives the storage type tag for this kind on the given entity type,
    /// e.g. `AccountEmailSet`, `AccountDeleted`, `AccountAdminAdded`.
    pub fn type_tag(&self, entity_type: &str) -> String {
        let prefix = pascal_case(entity_type);
        match self {
            EventPayload::Created => format!("{}Created", prefix),
            EventPayload::AttributeSet { name, .. } => format!("{}{}Set", prefix, pascal_case(name)),
            EventPayload::AttributesUpdated { .. } => format!("{}AttributesUpdated", prefix),
            EventPayload::Deleted => format!("{}Deleted", prefix),
            EventPayload::RoleAdded { role, .. } => format!("{}{}Added", prefix, pascal_case(role)),
            EventPayload::RoleRemoved { role, .. } => format!("{}{}Removed", prefix, pascal_case(role)),
            EventPayload::AllRolesRemoved => format!("{}AllRolesRemoved", prefix),
        }
    }

    /// Mutates exactly the attributes, roles, and flags this kind owns.
    ///
    /// Validation and coercion run to completion before the first mutation,
    /// so a failed apply leaves the entity untouched.
    pub(crate) fn apply(&self, entity: &mut Entity) -> Result<(), ReplayError> {
        let entity_type = Arc::clone(entity.entity_type());

        match self {
            EventPayload::Created => Ok(()),
            EventPayload::AttributeSet { name, value } => {
                let spec = entity_type
                    .attribute(name)
                    .filter(|spec| spec.has_set_event())
                    .ok_or_else(|| self.unknown_kind(&entity_type))?;
                let coerced = spec
                    .kind()
                    .coerce(name, value.clone())
                    .map_err(|source| self.invalid_payload(&entity_type, &source))?;

                entity.attributes.insert(name.clone(), coerced);
                Ok(())
            }
            EventPayload::AttributesUpdated { attrs } => {
                let mut staged = Vec::with_capacity(attrs.len());
                for (name, value) in attrs {
                    let spec = entity_type.attribute(name).ok_or_else(|| {
                        self.invalid_payload_reason(&entity_type, format!("attribute [{}] not recognised", name))
                    })?;
                    let coerced = spec
                        .kind()
                        .coerce(name, value.clone())
                        .map_err(|source| self.invalid_payload(&entity_type, &source))?;
                    staged.push((name.clone(), coerced));
                }

                for (name, value) in staged {
                    entity.attributes.insert(name, value);
                }
                Ok(())
            }
            EventPayload::Deleted => {
                entity.deleted = true;
                Ok(())
            }
            EventPayload::RoleAdded { role, member } => {
                let members = entity
                    .roles
                    .get_mut(role)
                    .ok_or_else(|| self.unknown_kind(&entity_type))?;
                // Tolerates duplicate application; the set never holds the
                // same member twice.
                if !members.contains(member) {
                    members.push(*member);
                }
                Ok(())
            }
            EventPayload::RoleRemoved { role, member } => {
                let members = entity
                    .roles
                    .get_mut(role)
                    .ok_or_else(|| self.unknown_kind(&entity_type))?;
                members.retain(|m| m != member);
                Ok(())
            }
            EventPayload::AllRolesRemoved => {
                for members in entity.roles.values_mut() {
                    members.clear();
                }
                Ok(())
            }
        }
    }

    fn unknown_kind(&self, entity_type: &EntityType) -> ReplayError {
        ReplayError::UnknownEventKind {
            entity_type: entity_type.name().to_owned(),
            type_tag: self.type_tag(entity_type.name()),
        }
    }

    fn invalid_payload(&self, entity_type: &EntityType, source: &EntityError) -> ReplayError {
        self.invalid_payload_reason(entity_type, source.to_string())
    }

    fn invalid_payload_reason(&self, entity_type: &EntityType, reason: String) -> ReplayError {
        ReplayError::InvalidPayload {
            type_tag: self.type_tag(entity_type.name()),
            reason,
        }
    }
}
