use sixdegrees::{
    DegreesError, EntityKind, GraphStore, PersonResult, Pyramid, SqliteStore, StoreConfig,
    config::open_store,
};
use tempfile::tempdir;

fn sample_store() -> (SqliteStore, [i64; 3], [i64; 2]) {
    let store = SqliteStore::open_in_memory().expect("store");
    let r = store.insert_person("R").expect("R");
    let a = store.insert_person("A").expect("A");
    let c = store.insert_person("C").expect("C");
    let f1 = store.insert_group("F1").expect("F1");
    let f2 = store.insert_group("F2").expect("F2");
    assert!(store.insert_membership(f1, r).expect("R in F1"));
    assert!(store.insert_membership(f1, a).expect("A in F1"));
    assert!(store.insert_membership(f2, c).expect("C in F2"));
    (store, [r, a, c], [f1, f2])
}

#[test]
fn test_neighbors_are_sorted_and_distinct() {
    let (store, [r, a, _], [f1, f2]) = sample_store();
    assert!(!store.insert_membership(f1, a).expect("duplicate"));
    assert!(store.insert_membership(f2, a).expect("A in F2"));
    assert_eq!(store.neighbors_of_person(a).expect("groups"), vec![f1, f2]);
    assert_eq!(store.neighbors_of_group(f1).expect("members"), vec![r, a]);
    assert!(store.neighbors_of_person(9999).expect("missing").is_empty());
}

#[test]
fn test_membership_requires_existing_entities() {
    let (store, [r, _, _], [f1, _]) = sample_store();
    let err = store.insert_membership(f1, 9999).expect_err("missing person");
    assert!(matches!(err, DegreesError::InvalidInput(_)));
    let err = store.insert_membership(9999, r).expect_err("missing group");
    assert!(matches!(err, DegreesError::InvalidInput(_)));
    assert!(store.insert_person("   ").is_err());
}

#[test]
fn test_neighbor_cache_is_invalidated_by_new_memberships() {
    let (store, [_, a, c], [f1, _]) = sample_store();
    let before = store.neighbors_of_group(f1).expect("members");
    store.neighbors_of_group(f1).expect("cached");
    assert!(store.cache_stats().hits >= 1);
    store.insert_membership(f1, c).expect("C in F1");
    let after = store.neighbors_of_group(f1).expect("members");
    assert_eq!(after.len(), before.len() + 1);
    assert!(after.contains(&c) && after.contains(&a));
}

#[test]
fn test_resolve_by_name_ignores_case_and_prefers_lowest_id() {
    let (store, [_, a, _], _) = sample_store();
    store.insert_person("a").expect("second a");
    let record = store
        .resolve_by_name(EntityKind::Person, "a")
        .expect("resolve")
        .expect("found");
    assert_eq!(record.id, a);
    assert_eq!(record.name, "A");
    assert!(record.cached.is_none());
    assert!(
        store
            .resolve_by_name(EntityKind::Group, "f2")
            .expect("resolve")
            .is_some()
    );
    assert!(
        store
            .resolve_by_name(EntityKind::Person, "nobody")
            .expect("resolve")
            .is_none()
    );
}

#[test]
fn test_results_round_trip_through_people_rows() {
    let (store, [r, a, _], [f1, _]) = sample_store();
    store
        .upsert_results(&[PersonResult::new(r, Vec::new()), PersonResult::new(a, vec![f1])])
        .expect("upsert");
    let record = store.get_entity(EntityKind::Person, a).expect("A");
    let cached = record.cached.expect("cached");
    assert_eq!(cached.path, vec![f1]);
    assert_eq!(cached.degrees, 1);
    assert_eq!(store.counts().expect("counts").cached_results, 2);
}

#[test]
fn test_unreachable_groups_people_without_degrees() {
    let (store, [r, a, _], [f1, _]) = sample_store();
    store.set_root(r).expect("root");
    store
        .upsert_results(&[PersonResult::new(a, vec![f1])])
        .expect("upsert");
    let unreachable = store.unreachable_people().expect("unreachable");
    assert_eq!(unreachable.len(), 1);
    assert_eq!(unreachable.get("F2"), Some(&vec!["C".to_string()]));
}

#[test]
fn test_pyramid_state_persists_for_the_root() {
    let (store, [r, a, _], _) = sample_store();
    assert!(store.root_person().expect("root").is_none());
    store.set_root(r).expect("root");
    assert_eq!(store.root_name().expect("name").as_deref(), Some("R"));
    let pyramid = Pyramid::new(r);
    store.save_pyramid(&pyramid).expect("save");
    assert_eq!(store.load_pyramid().expect("load"), Some(pyramid));

    store.set_root(r).expect("same root");
    assert!(store.load_pyramid().expect("load").is_some());
    store.set_root(a).expect("new root");
    assert!(store.load_pyramid().expect("load").is_none());
    assert_eq!(store.root_person().expect("root"), Some(a));
    assert!(matches!(
        store.set_root(9999).expect_err("missing"),
        DegreesError::NotFound(_)
    ));
}

#[test]
fn test_corrupt_saved_state_is_rejected() {
    let (store, [r, _, _], _) = sample_store();
    store.set_root(r).expect("root");
    let mut pyramid = Pyramid::new(r);
    pyramid.tiers[0].cursor = 5;
    store.save_pyramid(&pyramid).expect("save");
    let err = store.load_pyramid().expect_err("corrupt");
    assert!(matches!(err, DegreesError::CorruptState(_)));
}

#[test]
fn test_entity_names_handles_large_id_lists() {
    let store = SqliteStore::open_in_memory().expect("store");
    let ids: Vec<i64> = (0..1200)
        .map(|idx| store.insert_person(&format!("P{idx}")).expect("person"))
        .collect();
    let names = store.entity_names(EntityKind::Person, &ids).expect("names");
    assert_eq!(names.len(), ids.len());
    assert_eq!(names.get(&ids[1100]).map(String::as_str), Some("P1100"));
}

#[test]
fn test_file_store_reopens_with_data() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("degrees.db");
    let database = path.to_str().expect("utf8 path");
    {
        let store = open_store(database, &StoreConfig::default()).expect("open");
        let r = store.insert_person("R").expect("R");
        store.set_root(r).expect("root");
    }
    let cfg = StoreConfig {
        adjacency_cache_capacity: Some(0),
        ..StoreConfig::default()
    }
    .with_pragma("synchronous", "OFF");
    let store = open_store(database, &cfg).expect("reopen");
    assert_eq!(store.root_name().expect("name").as_deref(), Some("R"));
    assert_eq!(store.counts().expect("counts").people, 1);
}
