//! An entity modelling engine where an entity's mutable state is derived
//! exclusively from an ordered, append-only sequence of immutable events.
//!
//! Declaring an attribute on an [`EntityType`] produces the event kinds, the
//! setter behavior, and the replay logic that keep that derivation
//! consistent; the [`store`] module draws the narrow boundary any durable
//! backend drives (append events, load history, load/record snapshots).

mod entity;
mod error;
mod event;
mod manager;
mod replay;
mod roles;
mod schema;
pub mod store;
mod update;
mod value;

pub use crate::entity::Entity;
pub use crate::error::{DefinitionError, EntityError, ReplayError};
pub use crate::event::{EntityEvent, EventPayload};
pub use crate::manager::EntityManager;
pub use crate::replay::replay;
pub use crate::schema::{AttributeKind, AttributeSpec, EntityType, EntityTypeBuilder};
pub use crate::value::{Symbol, Value};

/// Entity versions increase by exactly one per applied event; the store
/// boundary compares them for optimistic concurrency.
pub type Version = u64;
