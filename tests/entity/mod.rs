use eventity::{Entity, EntityError, Value};

use crate::fixture::{account, account_type, actor, at, changes};

#[test]
fn create_records_one_initial_event_plus_field_sets() {
    let by = actor();
    let entity = Entity::create(
        account_type(),
        by,
        at(1),
        changes(&[("email", Value::text("a@example.com"))]),
    )
    .unwrap();

    assert_eq!(entity.version(), 2);
    assert_eq!(entity.uncommitted_events().len(), 2);
    assert_eq!(entity.uncommitted_events()[0].type_tag(), "AccountCreated");
    assert_eq!(entity.uncommitted_events()[1].type_tag(), "AccountEmailSet");
    assert_eq!(entity.uncommitted_events()[1].by(), Some(by));
    assert_eq!(entity.created(), Some(at(1)));
    assert_eq!(entity.last_modified(), Some(at(1)));
    assert_eq!(entity.get("email").unwrap(), Value::text("a@example.com"));
}

#[test]
fn setting_the_held_value_records_nothing() {
    let by = actor();
    let mut entity = account(by);
    entity.set_attribute(by, at(2), "email", Value::text("a@example.com")).unwrap();

    let version = entity.version();
    let modified = entity.last_modified();

    entity.set_attribute(by, at(3), "email", Value::text("a@example.com")).unwrap();

    assert_eq!(entity.version(), version);
    assert_eq!(entity.last_modified(), modified);
    assert_eq!(entity.uncommitted_events().len(), 2);
}

#[test]
fn version_counts_every_applied_event() {
    let by = actor();
    let mut entity = account(by);

    for n in 0..5i64 {
        entity
            .set_attribute(by, at(2 + n), "display_name", Value::text(format!("name-{}", n)))
            .unwrap();
    }

    assert_eq!(entity.version(), 6);
    assert_eq!(entity.uncommitted_events().len(), 6);
}

#[test]
fn delete_sets_the_flag_for_good() {
    let by = actor();
    let mut entity = account(by);
    assert!(!entity.deleted());

    entity.delete(by, at(2)).unwrap();
    assert!(entity.deleted());
    assert_eq!(entity.uncommitted_events()[1].type_tag(), "AccountDeleted");

    // Later events never revert the flag.
    entity.set_attribute(by, at(3), "email", Value::text("b@example.com")).unwrap();
    assert!(entity.deleted());
    assert_eq!(entity.version(), 3);
}

#[test]
fn boolean_attributes_default_only_when_unset() {
    let by = actor();
    let mut entity = account(by);

    assert_eq!(entity.get("disabled").unwrap(), Value::Bool(false));
    assert!(!entity.flag("disabled").unwrap());
    assert_eq!(entity.get("verified").unwrap(), Value::Bool(true));
    assert!(entity.flag("verified").unwrap());

    // Explicit false is distinct from unset: it beats a true default.
    entity.set_attribute(by, at(2), "verified", Value::Bool(false)).unwrap();
    assert_eq!(entity.get("verified").unwrap(), Value::Bool(false));
    assert_eq!(entity.uncommitted_events().len(), 2);

    // Setting the value the default already reads as records nothing.
    entity.set_attribute(by, at(3), "disabled", Value::Bool(false)).unwrap();
    assert_eq!(entity.uncommitted_events().len(), 2);
}

#[test]
fn flag_rejects_non_boolean_attributes() {
    let by = actor();
    let entity = account(by);

    assert!(matches!(entity.flag("email"), Err(EntityError::InvalidValue { .. })));
}

#[test]
fn symbol_attributes_normalise_text() {
    let by = actor();
    let mut entity = account(by);

    entity.set_attribute(by, at(2), "status", Value::text("active")).unwrap();
    assert_eq!(entity.get("status").unwrap(), Value::symbol("active"));

    // Text and symbol forms of the same value compare equal after
    // normalisation, so this records nothing.
    entity.set_attribute(by, at(3), "status", Value::symbol("active")).unwrap();
    assert_eq!(entity.uncommitted_events().len(), 2);
}

#[test]
fn symbol_attributes_clear_to_null() {
    let by = actor();
    let mut entity = account(by);

    entity.set_attribute(by, at(2), "status", Value::text("active")).unwrap();
    entity.set_attribute(by, at(3), "status", Value::Null).unwrap();

    assert_eq!(entity.get("status").unwrap(), Value::Null);
    assert_eq!(entity.uncommitted_events().len(), 3);
}

#[test]
fn symbol_list_reads_empty_and_normalises_elements() {
    let by = actor();
    let mut entity = account(by);

    assert_eq!(entity.get("tags").unwrap(), Value::SymbolList(vec![]));

    entity
        .set_attribute(
            by,
            at(2),
            "tags",
            Value::List(vec![Value::text("work"), Value::symbol("home")]),
        )
        .unwrap();

    assert_eq!(
        entity.get("tags").unwrap(),
        Value::SymbolList(vec!["work".into(), "home".into()])
    );
}

#[test]
fn symbol_map_has_no_dedicated_setter() {
    let by = actor();
    let mut entity = account(by);

    let result = entity.set_attribute(by, at(2), "preferences", Value::Map(Default::default()));
    assert_eq!(result.unwrap_err(), EntityError::NoSetter("preferences".to_owned()));
    assert_eq!(entity.uncommitted_events().len(), 1);
}

#[test]
fn unknown_attribute_is_rejected() {
    let by = actor();
    let mut entity = account(by);

    let result = entity.set_attribute(by, at(2), "does_not_exist", Value::Int(1));
    assert_eq!(
        result.unwrap_err(),
        EntityError::UnrecognizedAttribute("does_not_exist".to_owned())
    );
    assert!(matches!(entity.get("does_not_exist"), Err(EntityError::UnrecognizedAttribute(_))));
}

#[test]
fn invalid_value_for_kind_is_rejected() {
    let by = actor();
    let mut entity = account(by);

    let result = entity.set_attribute(by, at(2), "disabled", Value::Int(1));
    assert!(matches!(result, Err(EntityError::InvalidValue { .. })));
    assert_eq!(entity.uncommitted_events().len(), 1);
}

#[test]
fn equality_is_id_and_version() {
    let by = actor();
    let entity = account(by);
    let mut twin = entity.clone();

    assert_eq!(entity, twin);

    twin.set_attribute(by, at(2), "email", Value::text("a@example.com")).unwrap();
    assert_ne!(entity, twin);

    // Same version, different identifier.
    assert_ne!(entity, account(by));
}

#[test]
fn display_prints_type_and_id() {
    let entity = account(actor());
    assert_eq!(format!("{}", entity), format!("#<Account id={}>", entity.id()));
}
