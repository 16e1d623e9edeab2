use rusqlite::Connection;
use slugkit_core::db::open_db_in_memory;
use slugkit_core::{
    create_collection, Document, Identifier, KeyType, KeyTypeDescriptor, Lookup, ObjectId,
    Resolution, ResolveError, Resolver, ResolverConfig, SlugStrategy, SqliteCollectionStore,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const FIRST_ID: &str = "4e9b8e4f5b4f1a0001000001";
const SECOND_ID: &str = "4e9b8e4f5b4f1a0001000002";

fn seed_posts(conn: &mut Connection) {
    create_collection(conn, "posts", &KeyType::ObjectId).unwrap();
    let mut store = SqliteCollectionStore::try_new(conn, "posts").unwrap();
    store
        .insert_document(&Document::new("posts", FIRST_ID).with_slugs(["a", "a-old"]))
        .unwrap();
    store
        .insert_document(&Document::new("posts", SECOND_ID).with_slugs(["c"]))
        .unwrap();
}

fn posts_resolver(
    conn: &mut Connection,
    config: ResolverConfig,
) -> Resolver<SqliteCollectionStore<'_>> {
    let store = SqliteCollectionStore::try_new(conn, "posts").unwrap();
    Resolver::new(store.schema().clone(), store, config)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn single_slug_returns_bare_document() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let resolution = resolver.find(Lookup::One("a".into())).unwrap();
    match resolution {
        Resolution::One(Some(doc)) => assert_eq!(doc.id, FIRST_ID),
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[test]
fn historical_alias_resolves_to_same_document() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let doc = resolver.find_one("a-old").unwrap().unwrap();
    assert_eq!(doc.id, FIRST_ID);
    assert_eq!(doc.slug(), Some("a"));
}

#[test]
fn collection_argument_always_returns_sequence() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let resolution = resolver.find(Lookup::from(vec!["c"])).unwrap();
    match resolution {
        Resolution::Many(docs) => {
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].id, SECOND_ID);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[test]
fn missing_single_slug_raises_not_found_with_full_payload() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let err = resolver.find(Lookup::One("abc".into())).unwrap_err();
    match err {
        ResolveError::DocumentNotFound(payload) => {
            assert_eq!(payload.collection, "posts");
            assert_eq!(payload.requested, strings(&["abc"]));
            assert_eq!(payload.missing, strings(&["abc"]));
            assert!(payload.is_total());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_input_reports_only_unmatched_values() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let err = resolver.find_many(["a", "a", "b"]).unwrap_err();
    match err {
        ResolveError::DocumentNotFound(payload) => {
            assert_eq!(payload.requested, strings(&["a", "a", "b"]));
            assert_eq!(payload.missing, strings(&["b"]));
            assert!(!payload.is_total());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn disabled_policy_returns_deduplicated_partial_set() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::lenient());

    let docs = resolver.find_many(["a", "a", "b", "a-old"]).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, FIRST_ID);

    assert_eq!(resolver.find_one("zzz").unwrap(), None);
    assert_eq!(
        resolver.find(Lookup::One("zzz".into())).unwrap(),
        Resolution::One(None)
    );
}

#[test]
fn object_id_strings_take_key_path() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let docs = resolver.find_many([SECOND_ID, FIRST_ID]).unwrap();
    let ids: BTreeSet<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids, BTreeSet::from([FIRST_ID, SECOND_ID]));

    let typed = ObjectId::parse_str(FIRST_ID).unwrap();
    assert_eq!(resolver.find_one(typed).unwrap().unwrap().id, FIRST_ID);
}

#[test]
fn missing_primary_key_raises_not_found_over_keys() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let absent = "4e9b8e4f5b4f1a00010000ff";
    let err = resolver.find_many([FIRST_ID, absent]).unwrap_err();
    match err {
        ResolveError::DocumentNotFound(payload) => {
            assert_eq!(payload.missing, strings(&[absent]));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mixed_batch_with_one_key_like_value_takes_key_path() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::lenient());

    assert!(!resolver.looks_like_slugs(&[Identifier::from("a"), Identifier::from(FIRST_ID)]));
    let docs = resolver.find_many(["a", FIRST_ID]).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, FIRST_ID);
}

#[test]
fn blank_identifiers_are_invalid_arguments() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    assert!(matches!(
        resolver.find(Lookup::One(Identifier::Null)),
        Err(ResolveError::InvalidArgument(_))
    ));
    assert!(matches!(
        resolver.find_many(["a", ""]),
        Err(ResolveError::InvalidArgument(message)) if message.contains("position 1")
    ));
    assert!(matches!(
        resolver.find_by_slug(""),
        Err(ResolveError::InvalidArgument(_))
    ));
}

#[test]
fn empty_collection_argument_returns_empty_sequence() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());

    let empty: Vec<&str> = Vec::new();
    assert!(resolver.find_many(empty).unwrap().is_empty());
}

#[test]
fn repeated_lookups_are_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::lenient());

    let collect_ids = || -> BTreeSet<String> {
        resolver
            .find_many(["c", "a", "nope"])
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect()
    };
    let first = collect_ids();
    for _ in 0..3 {
        assert_eq!(collect_ids(), first);
    }
    assert_eq!(first.len(), 2);
}

#[test]
fn string_keyed_collection_never_auto_resolves_slugs() {
    let mut conn = open_db_in_memory().unwrap();
    create_collection(&conn, "pages", &KeyType::String).unwrap();
    let mut store = SqliteCollectionStore::try_new(&mut conn, "pages").unwrap();
    store
        .insert_document(&Document::new("pages", "about").with_slugs(["about-us"]))
        .unwrap();
    let resolver = Resolver::new(store.schema().clone(), &store, ResolverConfig::default());

    assert_eq!(resolver.find_one("about").unwrap().unwrap().id, "about");
    assert!(matches!(
        resolver.find_one("about-us"),
        Err(ResolveError::DocumentNotFound(_))
    ));
    assert_eq!(
        resolver.find_by_slug("about-us").unwrap().unwrap().id,
        "about"
    );
}

#[test]
fn override_strategy_enables_slugs_for_string_keys() {
    let mut conn = open_db_in_memory().unwrap();
    create_collection(&conn, "users", &KeyType::String).unwrap();
    let mut store = SqliteCollectionStore::try_new(&mut conn, "users").unwrap();
    store
        .insert_document(&Document::new("users", "usr_1").with_slugs(["jane-doe"]))
        .unwrap();

    let prefixed: SlugStrategy = Arc::new(|value: &str| value.starts_with("usr_"));
    let schema = slugkit_core::CollectionSchema::new(
        "users",
        KeyTypeDescriptor::with_strategy(KeyType::String, prefixed),
    )
    .unwrap();
    let resolver = Resolver::new(schema, &store, ResolverConfig::default());

    assert_eq!(resolver.find_one("jane-doe").unwrap().unwrap().id, "usr_1");
    assert_eq!(resolver.find_one("usr_1").unwrap().unwrap().id, "usr_1");
}

#[test]
fn integer_keyed_collection_defaults_to_slug_lookup() {
    let mut conn = open_db_in_memory().unwrap();
    create_collection(&conn, "tickets", &KeyType::Integer).unwrap();
    let mut store = SqliteCollectionStore::try_new(&mut conn, "tickets").unwrap();
    store
        .insert_document(&Document::new("tickets", "42").with_slugs(["printer-on-fire"]))
        .unwrap();
    let resolver = Resolver::new(store.schema().clone(), &store, ResolverConfig::default());

    assert!(resolver.looks_like_slugs(&[Identifier::from("42")]));
    assert_eq!(
        resolver.find_one("printer-on-fire").unwrap().unwrap().id,
        "42"
    );
    assert_eq!(resolver.find_one(42_i64).unwrap().unwrap().id, "42");
    assert!(matches!(
        resolver.find_one("42"),
        Err(ResolveError::DocumentNotFound(_))
    ));
}

#[test]
fn upper_case_object_id_text_resolves_like_typed_id() {
    let mut conn = open_db_in_memory().unwrap();
    seed_posts(&mut conn);
    let resolver = posts_resolver(&mut conn, ResolverConfig::default());
    let upper = FIRST_ID.to_ascii_uppercase();

    let typed = ObjectId::parse_str(&upper).unwrap();
    assert_eq!(resolver.find_one(typed).unwrap().unwrap().id, FIRST_ID);
    assert_eq!(
        resolver.find_one(upper.as_str()).unwrap().unwrap().id,
        FIRST_ID
    );

    let docs = resolver
        .find_many([upper.as_str(), SECOND_ID])
        .unwrap();
    assert_eq!(docs.len(), 2);
}
