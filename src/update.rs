//! The bulk update dispatcher: translates a multi-attribute change request
//! into the minimal correct set of events.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::EntityError;
use crate::event::{EntityEvent, EventPayload};
use crate::value::Value;

impl Entity {
    /// Applies a set of attribute changes.
    ///
    /// Changes whose attribute generates a dedicated setter event go through
    /// that setter, one precisely-typed event each. The remainder is batched
    /// into at most one generic `AttributesUpdated` event per call. Changes
    /// that leave an attribute at its current value record nothing.
    ///
    /// The whole change set is validated up front: an unrecognised name or a
    /// value invalid for its kind fails the call before any event is
    /// recorded.
    pub fn update(
        &mut self,
        by: Uuid,
        at: DateTime<Utc>,
        changes: BTreeMap<String, Value>,
    ) -> Result<(), EntityError> {
        let entity_type = Arc::clone(&self.entity_type);

        let mut planned = Vec::with_capacity(changes.len());
        for (name, value) in changes {
            let spec = entity_type
                .attribute(&name)
                .ok_or_else(|| EntityError::UnrecognizedAttribute(name.clone()))?;

            let coerced = spec.kind().coerce(&name, value)?;
            if coerced == spec.read_value(self.raw(&name)) {
                continue;
            }

            planned.push((name, coerced, spec.has_set_event()));
        }

        let mut residual = BTreeMap::new();
        for (name, value, dedicated) in planned {
            if dedicated {
                self.set_attribute(by, at, &name, value)?;
            } else {
                residual.insert(name, value);
            }
        }

        if !residual.is_empty() {
            let event = EntityEvent::new(
                entity_type.name(),
                Some(by),
                at,
                EventPayload::AttributesUpdated { attrs: residual },
            );
            self.record(event)?;
        }

        Ok(())
    }
}
