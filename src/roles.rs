//! Named many-to-many membership sets: ordered, deduplicated sets of foreign
//! entity identifiers with auditable add/remove history.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::EntityError;
use crate::event::{EntityEvent, EventPayload};

impl Entity {
    /// Current members of the role, in the order they were added.
    pub fn role_members(&self, role: &str) -> Result<&[Uuid], EntityError> {
        self.roles
            .get(role)
            .map(Vec::as_slice)
            .ok_or_else(|| EntityError::UnknownRole(role.to_owned()))
    }

    pub fn in_role(&self, role: &str, member: Uuid) -> Result<bool, EntityError> {
        Ok(self.role_members(role)?.contains(&member))
    }

    /// Adds a foreign entity to the role. Adding a member already present is
    /// a no-op: no event, no state change.
    pub fn add_to_role(&mut self, role: &str, by: Uuid, at: DateTime<Utc>, member: Uuid) -> Result<(), EntityError> {
        if self.in_role(role, member)? {
            return Ok(());
        }

        let event = EntityEvent::new(
            self.entity_type.name(),
            Some(by),
            at,
            EventPayload::RoleAdded {
                role: role.to_owned(),
                member,
            },
        );
        self.record(event)
    }

    /// Removes a foreign id from the role.
    ///
    /// With `skip_existence_check` unset, removing an id that is not a
    /// member is a precondition error and nothing changes; with it set, the
    /// absence is expected and the call silently does nothing.
    pub fn remove_from_role(
        &mut self,
        role: &str,
        by: Uuid,
        at: DateTime<Utc>,
        member: Uuid,
        skip_existence_check: bool,
    ) -> Result<(), EntityError> {
        if !self.in_role(role, member)? {
            if skip_existence_check {
                return Ok(());
            }
            return Err(EntityError::NotAMember {
                role: role.to_owned(),
                member,
            });
        }

        let event = EntityEvent::new(
            self.entity_type.name(),
            Some(by),
            at,
            EventPayload::RoleRemoved {
                role: role.to_owned(),
                member,
            },
        );
        self.record(event)
    }

    /// Removes the foreign id from every declared role; absence in some
    /// roles is expected and not an error.
    pub fn remove_from_all_roles(&mut self, by: Uuid, at: DateTime<Utc>, member: Uuid) -> Result<(), EntityError> {
        let roles: Vec<String> = self.entity_type.roles().to_vec();
        for role in roles {
            self.remove_from_role(&role, by, at, member, true)?;
        }
        Ok(())
    }

    /// Clears every declared role in a single event: a full role reset, not
    /// per-member removal.
    pub fn clear_all_roles(&mut self, by: Uuid, at: DateTime<Utc>) -> Result<(), EntityError> {
        let event = EntityEvent::new(self.entity_type.name(), Some(by), at, EventPayload::AllRolesRemoved);
        self.record(event)
    }
}
