use std::sync::Arc;

use uuid::Uuid;

use crate::entity::Entity;
use crate::replay::replay;
use crate::schema::EntityType;
use crate::store::{EntityStore, StoreError};
use crate::Version;

/// The EntityManager couples one entity type with a store, so that recorded
/// events can be persisted and entity state can be reconstructed by loading
/// and applying events sequentially.
///
/// The basic APIs are:
/// 1. load / load_many
/// 2. save
/// 3. snapshot
pub struct EntityManager<S>
where
    S: EntityStore,
{
    entity_type: Arc<EntityType>,
    store: S,
}

impl<S> EntityManager<S>
where
    S: EntityStore,
{
    /// Creates a new instance of an [`EntityManager`].
    pub fn new(entity_type: Arc<EntityType>, store: S) -> Self {
        Self { entity_type, store }
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Returns the internal store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity from the store by folding its snapshot and the events
    /// recorded after it, in the order of their version numbers.
    ///
    /// A snapshot that carries `last_modified` but no `created` cannot be
    /// trusted: the created timestamp would have to be back-filled from a
    /// partial tail, and the back-filled value would be wrong. Such a
    /// snapshot is discarded and the entity replays from the beginning of
    /// its history.
    #[tracing::instrument(skip_all, fields(entity_id = %id), err)]
    pub async fn load(&self, id: Uuid) -> Result<Option<Entity>, StoreError> {
        let stream = self.store.load(id).await?;
        if stream.is_empty() {
            return Ok(None);
        }

        let (snapshot, events) = match stream.snapshot {
            Some(snapshot) if snapshot.created.is_none() && snapshot.last_modified.is_some() => {
                tracing::debug!(entity_id = %id, "snapshot has no created timestamp, replaying full history");
                (None, self.store.history(id).await?)
            }
            snapshot => (snapshot, stream.events),
        };

        let events = events.into_iter().map(|stored| stored.event).collect();
        let entity = replay(Arc::clone(&self.entity_type), id, snapshot, events)?;

        Ok(Some(entity))
    }

    /// Loads the entities for the given ids; ids the store has never seen
    /// are skipped.
    pub async fn load_many(&self, ids: &[Uuid]) -> Result<Vec<Entity>, StoreError> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.load(*id).await? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    /// Persists the entity's uncommitted events under an optimistic version
    /// check, and marks them committed once the store confirms.
    #[tracing::instrument(skip_all, fields(entity_id = %entity.id()), err)]
    pub async fn save(&self, entity: &mut Entity) -> Result<(), StoreError> {
        let pending = entity.uncommitted_events();
        if pending.is_empty() {
            return Ok(());
        }

        let expected = entity.version() - pending.len() as Version;
        self.store.append(entity.id(), expected, pending).await?;
        entity.mark_committed();

        Ok(())
    }

    /// Records a snapshot of the entity's current state.
    pub async fn snapshot(&self, entity: &Entity) -> Result<(), StoreError> {
        self.store.record_snapshot(entity.snapshot()).await
    }
}
