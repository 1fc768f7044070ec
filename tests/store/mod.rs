use uuid::Uuid;

use eventity::store::{EntityStore, InMemoryStore, StoreError};
use eventity::{Entity, EntityManager, Value};

use crate::fixture::{account_type, actor, at, changes};

fn manager() -> EntityManager<InMemoryStore> {
    EntityManager::new(account_type(), InMemoryStore::new())
}

#[tokio::test]
async fn save_and_load_round_trips() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(
        account_type(),
        by,
        at(1),
        changes(&[("email", Value::text("a@example.com"))]),
    )
    .unwrap();

    manager.save(&mut entity).await.unwrap();
    assert!(entity.uncommitted_events().is_empty());

    let loaded = manager.load(entity.id()).await.unwrap().unwrap();
    assert_eq!(loaded, entity);
    assert_eq!(loaded.snapshot(), entity.snapshot());
}

#[tokio::test]
async fn loading_an_unknown_id_yields_nothing() {
    let manager = manager();
    assert!(manager.load(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn saving_nothing_is_a_no_op() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(account_type(), by, at(1), Default::default()).unwrap();

    manager.save(&mut entity).await.unwrap();
    manager.save(&mut entity).await.unwrap();

    let history = manager.store().history(entity.id()).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn concurrent_saves_conflict_on_version() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(account_type(), by, at(1), Default::default()).unwrap();
    manager.save(&mut entity).await.unwrap();

    let mut first = manager.load(entity.id()).await.unwrap().unwrap();
    let mut second = manager.load(entity.id()).await.unwrap().unwrap();

    first.set_attribute(by, at(2), "email", Value::text("first@example.com")).unwrap();
    second.set_attribute(by, at(3), "email", Value::text("second@example.com")).unwrap();

    manager.save(&mut first).await.unwrap();
    let err = manager.save(&mut second).await.unwrap_err();

    assert!(matches!(err, StoreError::VersionConflict { .. }));
    // The conflict is retryable: reload and reapply.
    let mut fresh = manager.load(entity.id()).await.unwrap().unwrap();
    fresh.set_attribute(by, at(3), "email", Value::text("second@example.com")).unwrap();
    manager.save(&mut fresh).await.unwrap();

    let loaded = manager.load(entity.id()).await.unwrap().unwrap();
    assert_eq!(loaded.get("email").unwrap(), Value::text("second@example.com"));
}

#[tokio::test]
async fn load_many_skips_unknown_ids() {
    let manager = manager();
    let by = actor();
    let mut a = Entity::create(account_type(), by, at(1), Default::default()).unwrap();
    let mut b = Entity::create(account_type(), by, at(2), Default::default()).unwrap();
    manager.save(&mut a).await.unwrap();
    manager.save(&mut b).await.unwrap();

    let entities = manager.load_many(&[a.id(), Uuid::new_v4(), b.id()]).await.unwrap();

    assert_eq!(entities.len(), 2);
    assert!(entities.contains(&a));
    assert!(entities.contains(&b));
}

#[tokio::test]
async fn loading_resumes_from_the_latest_snapshot() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(
        account_type(),
        by,
        at(1),
        changes(&[("email", Value::text("a@example.com"))]),
    )
    .unwrap();
    manager.save(&mut entity).await.unwrap();
    manager.snapshot(&entity).await.unwrap();

    entity.set_attribute(by, at(5), "status", Value::text("active")).unwrap();
    manager.save(&mut entity).await.unwrap();

    // Only the events recorded after the snapshot are streamed back.
    let stream = manager.store().load(entity.id()).await.unwrap();
    assert_eq!(stream.snapshot.as_ref().map(|s| s.version), Some(2));
    assert_eq!(stream.events.len(), 1);

    let loaded = manager.load(entity.id()).await.unwrap().unwrap();
    assert_eq!(loaded, entity);
    assert_eq!(loaded.snapshot(), entity.snapshot());
}

#[tokio::test]
async fn a_created_less_snapshot_forces_full_replay() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(
        account_type(),
        by,
        at(1),
        changes(&[("email", Value::text("a@example.com"))]),
    )
    .unwrap();
    manager.save(&mut entity).await.unwrap();

    // A snapshot predating the created timestamp: it cannot be patched, the
    // entity has to replay from the beginning of history.
    let mut snapshot = entity.snapshot();
    snapshot.created = None;
    manager.store().record_snapshot(snapshot).await.unwrap();

    entity.set_attribute(by, at(5), "status", Value::text("active")).unwrap();
    manager.save(&mut entity).await.unwrap();

    let loaded = manager.load(entity.id()).await.unwrap().unwrap();
    assert_eq!(loaded.created(), Some(at(1)));
    assert_eq!(loaded.last_modified(), Some(at(5)));
    assert_eq!(loaded.version(), entity.version());
}

#[tokio::test]
async fn stored_events_carry_assigned_versions() {
    let manager = manager();
    let by = actor();
    let mut entity = Entity::create(
        account_type(),
        by,
        at(1),
        changes(&[("email", Value::text("a@example.com"))]),
    )
    .unwrap();
    manager.save(&mut entity).await.unwrap();

    let history = manager.store().history(entity.id()).await.unwrap();
    let versions: Vec<u64> = history.iter().map(|stored| stored.version).collect();

    assert_eq!(versions, vec![1, 2]);
    assert!(history.iter().all(|stored| stored.entity_id == entity.id()));
    assert_eq!(history[0].event.type_tag(), "AccountCreated");
}
