#![forbid(unsafe_code)]

use tirelog_contracts::artifact::{ArtifactMediaType, ImageArtifact};
use tirelog_contracts::auth::{OperationClass, Role, Session};
use tirelog_contracts::tire::{AuditEventKind, TireFields, TireId};
use tirelog_contracts::TimestampMs;
use tirelog_os::error::{AuthError, OpError};
use tirelog_os::{authz, lifecycle};
use tirelog_storage::store::TireStore;

fn tid(raw: &str) -> TireId {
    TireId::new(raw).unwrap()
}

fn session(role: Role) -> Session {
    Session {
        active_role: role,
        selected_tire: None,
    }
}

fn artifact() -> ImageArtifact {
    ImageArtifact::v1(ArtifactMediaType::Png, 4, 4, "aGk=".to_string()).unwrap()
}

fn fields(brand: &str) -> TireFields {
    TireFields {
        brand: Some(brand.to_string()),
        ..TireFields::default()
    }
}

#[test]
fn at_os_db_01_create_starts_history_with_creation_event() {
    let mut store = TireStore::new_in_memory();
    let s = session(Role::Add);

    lifecycle::create(&s, &mut store, tid("T1"), fields("Michelin"), TimestampMs(10)).unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.history.len(), 1);
    assert_eq!(r.history[0].kind, AuditEventKind::Creation);
    assert!(r.history[0].note.contains("ADD"));
    assert_eq!(r.created_at, TimestampMs(10));
    assert_eq!(r.updated_at, TimestampMs(10));
    assert!(r.photos.is_empty());
}

#[test]
fn at_os_db_02_every_mutation_appends_exactly_one_event() {
    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);
    let edit = session(Role::Edit);

    lifecycle::create(&add, &mut store, tid("T1"), fields("Michelin"), TimestampMs(10)).unwrap();
    lifecycle::update(&edit, &mut store, &tid("T1"), fields("Continental"), TimestampMs(20))
        .unwrap();
    lifecycle::relocate(&edit, &mut store, &tid("T1"), "warehouse", "E1", TimestampMs(30))
        .unwrap();
    lifecycle::add_photo(&edit, &mut store, &tid("T1"), artifact(), TimestampMs(40)).unwrap();
    lifecycle::attach_signature(&edit, &mut store, &tid("T1"), artifact(), TimestampMs(50))
        .unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.history.len(), 5);
    let kinds: Vec<AuditEventKind> = r.history.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::Creation,
            AuditEventKind::Update,
            AuditEventKind::Relocation,
            AuditEventKind::PhotoAdded,
            AuditEventKind::SignatureAttached,
        ]
    );
}

#[test]
fn at_os_db_03_updated_at_is_monotonic_under_backwards_clock() {
    let mut store = TireStore::new_in_memory();
    let edit = session(Role::Edit);

    lifecycle::create(&edit, &mut store, tid("T1"), fields("a"), TimestampMs(100)).unwrap();
    // Clock stepped backwards; updated_at must not regress.
    lifecycle::update(&edit, &mut store, &tid("T1"), fields("b"), TimestampMs(50)).unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.updated_at, TimestampMs(100));
}

#[test]
fn at_os_db_04_update_merges_and_retains_unspecified_fields() {
    let mut store = TireStore::new_in_memory();
    let edit = session(Role::Edit);

    lifecycle::create(
        &edit,
        &mut store,
        tid("T1"),
        TireFields {
            brand: Some("Michelin".to_string()),
            size: Some("205/55R16".to_string()),
            ..TireFields::default()
        },
        TimestampMs(10),
    )
    .unwrap();
    lifecycle::update(
        &edit,
        &mut store,
        &tid("T1"),
        TireFields {
            model: Some("Pilot".to_string()),
            ..TireFields::default()
        },
        TimestampMs(20),
    )
    .unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.brand, "Michelin");
    assert_eq!(r.size, "205/55R16");
    assert_eq!(r.model, "Pilot");
    assert_eq!(r.updated_at, TimestampMs(20));
}

#[test]
fn at_os_db_05_create_conflicts_on_existing_id() {
    let mut store = TireStore::new_in_memory();
    let s = session(Role::Add);

    lifecycle::create(&s, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    match lifecycle::create(&s, &mut store, tid("T1"), fields("b"), TimestampMs(20)) {
        Err(OpError::Conflict(id)) => assert_eq!(id, "T1"),
        other => panic!("expected conflict, got {other:?}"),
    }
    // Losing call left the record untouched.
    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.brand, "a");
    assert_eq!(r.history.len(), 1);
}

#[test]
fn at_os_db_06_update_and_relocate_fail_on_missing_id() {
    let mut store = TireStore::new_in_memory();
    let edit = session(Role::Edit);

    assert!(matches!(
        lifecycle::update(&edit, &mut store, &tid("NOPE"), fields("x"), TimestampMs(10)),
        Err(OpError::NotFound(_))
    ));
    assert!(matches!(
        lifecycle::relocate(&edit, &mut store, &tid("NOPE"), "w", "p", TimestampMs(10)),
        Err(OpError::NotFound(_))
    ));
    assert!(matches!(
        lifecycle::delete(&session(Role::Admin), &mut store, &tid("NOPE")),
        Err(OpError::NotFound(_))
    ));
}

#[test]
fn at_os_db_07_relocation_note_names_the_new_placement() {
    let mut store = TireStore::new_in_memory();
    let edit = session(Role::Edit);

    lifecycle::create(&edit, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    lifecycle::relocate(&edit, &mut store, &tid("T1"), "truck-7", "front-left", TimestampMs(20))
        .unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.location, "truck-7");
    assert_eq!(r.position, "front-left");
    let last = r.history.last().unwrap();
    assert_eq!(last.kind, AuditEventKind::Relocation);
    assert!(last.note.contains("truck-7"));
    assert!(last.note.contains("front-left"));
}

#[test]
fn at_os_db_08_signature_attachment_does_not_bump_updated_at() {
    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);

    lifecycle::create(&add, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    lifecycle::attach_signature(&add, &mut store, &tid("T1"), artifact(), TimestampMs(99))
        .unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.updated_at, TimestampMs(10));
    let last = r.history.last().unwrap();
    assert_eq!(last.kind, AuditEventKind::SignatureAttached);
    assert!(last.signature.is_some());
}

#[test]
fn at_os_db_09_add_photo_appends_and_bumps_updated_at() {
    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);

    lifecycle::create(&add, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    lifecycle::add_photo(&add, &mut store, &tid("T1"), artifact(), TimestampMs(20)).unwrap();
    lifecycle::add_photo(&add, &mut store, &tid("T1"), artifact(), TimestampMs(30)).unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.photos.len(), 2);
    assert_eq!(r.updated_at, TimestampMs(30));
    assert_eq!(r.history.len(), 3);
}

#[test]
fn at_os_db_10_permission_scenario_across_roles() {
    let mut store = TireStore::new_in_memory();

    // role=view: create is denied.
    match lifecycle::create(
        &session(Role::View),
        &mut store,
        tid("T1"),
        fields("a"),
        TimestampMs(10),
    ) {
        Err(OpError::Permission { role, class }) => {
            assert_eq!(role, Role::View);
            assert_eq!(class, OperationClass::Create);
        }
        other => panic!("expected permission error, got {other:?}"),
    }
    assert_eq!(store.tire_count(), 0);

    // role=add: same call succeeds.
    lifecycle::create(
        &session(Role::Add),
        &mut store,
        tid("T1"),
        fields("a"),
        TimestampMs(10),
    )
    .unwrap();

    // role=add: delete is denied.
    assert!(matches!(
        lifecycle::delete(&session(Role::Add), &mut store, &tid("T1")),
        Err(OpError::Permission { .. })
    ));
    assert!(store.get_tire(&tid("T1")).is_some());

    // role=admin: delete succeeds and the record is gone.
    lifecycle::delete(&session(Role::Admin), &mut store, &tid("T1")).unwrap();
    assert!(store.get_tire(&tid("T1")).is_none());
}

#[test]
fn at_os_db_11_add_role_cannot_update_or_relocate() {
    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);

    lifecycle::create(&add, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    assert!(matches!(
        lifecycle::update(&add, &mut store, &tid("T1"), fields("b"), TimestampMs(20)),
        Err(OpError::Permission { .. })
    ));
    assert!(matches!(
        lifecycle::relocate(&add, &mut store, &tid("T1"), "w", "p", TimestampMs(20)),
        Err(OpError::Permission { .. })
    ));
}

#[test]
fn at_os_db_12_credential_scenario() {
    let mut store = TireStore::new_in_memory();
    let mut s = Session::default();

    // Credential unset: admin elevation refused, session untouched.
    match authz::request_role(&mut s, &store, Role::Admin, "1234") {
        Err(OpError::Auth(AuthError::NoCredential)) => {}
        other => panic!("expected no-credential error, got {other:?}"),
    }
    assert_eq!(s.active_role, Role::View);

    authz::set_credential(&mut store, "1234").unwrap();

    let perms = authz::request_role(&mut s, &store, Role::Admin, "1234").unwrap();
    assert_eq!(s.active_role, Role::Admin);
    assert!(perms.allows(OperationClass::Delete));

    // Wrong secret: refused, active role unchanged from the prior success.
    match authz::request_role(&mut s, &store, Role::Admin, "9999") {
        Err(OpError::Auth(AuthError::Mismatch)) => {}
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(s.active_role, Role::Admin);
}

#[test]
fn at_os_db_13_edit_shares_the_admin_secret_when_configured() {
    let mut store = TireStore::new_in_memory();
    let mut s = Session::default();

    // No credential stored: edit elevation is unchecked.
    authz::request_role(&mut s, &store, Role::Edit, "").unwrap();
    assert_eq!(s.active_role, Role::Edit);

    authz::set_credential(&mut store, "1234").unwrap();

    let mut s2 = Session::default();
    assert!(matches!(
        authz::request_role(&mut s2, &store, Role::Edit, "9999"),
        Err(OpError::Auth(AuthError::Mismatch))
    ));
    assert_eq!(s2.active_role, Role::View);
    authz::request_role(&mut s2, &store, Role::Edit, "1234").unwrap();
    assert_eq!(s2.active_role, Role::Edit);

    // Add and view never require the secret.
    authz::request_role(&mut s2, &store, Role::Add, "").unwrap();
    assert_eq!(s2.active_role, Role::Add);
    authz::request_role(&mut s2, &store, Role::View, "").unwrap();
    assert_eq!(s2.active_role, Role::View);
}

#[test]
fn at_os_db_14_set_credential_overwrites_without_reauth() {
    let mut store = TireStore::new_in_memory();
    authz::set_credential(&mut store, "1234").unwrap();
    authz::set_credential(&mut store, "5678").unwrap();

    let mut s = Session::default();
    assert!(matches!(
        authz::request_role(&mut s, &store, Role::Admin, "1234"),
        Err(OpError::Auth(AuthError::Mismatch))
    ));
    authz::request_role(&mut s, &store, Role::Admin, "5678").unwrap();
}

#[test]
fn at_os_db_15_listing_sorts_by_updated_desc() {
    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);

    lifecycle::create(&add, &mut store, tid("A"), fields("a"), TimestampMs(10)).unwrap();
    lifecycle::create(&add, &mut store, tid("B"), fields("b"), TimestampMs(20)).unwrap();
    lifecycle::create(&add, &mut store, tid("C"), fields("c"), TimestampMs(15)).unwrap();

    let ids: Vec<&str> = lifecycle::list(&store).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C", "A"]);
}

#[test]
fn at_os_db_16_filtered_listing_matches_query_and_enums() {
    use tirelog_contracts::tire::{TireCategory, TireCondition};

    let mut store = TireStore::new_in_memory();
    let add = session(Role::Add);

    lifecycle::create(
        &add,
        &mut store,
        tid("T1"),
        TireFields {
            brand: Some("Michelin".to_string()),
            condition: Some(TireCondition::Worn),
            category: Some(TireCategory::Winter),
            ..TireFields::default()
        },
        TimestampMs(10),
    )
    .unwrap();
    lifecycle::create(
        &add,
        &mut store,
        tid("T2"),
        TireFields {
            brand: Some("Continental".to_string()),
            ..TireFields::default()
        },
        TimestampMs(20),
    )
    .unwrap();

    let hits = lifecycle::list_filtered(&store, Some("miche"), None, None);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id.as_str(), "T1");

    let hits = lifecycle::list_filtered(&store, None, Some(TireCondition::Worn), None);
    assert_eq!(hits.len(), 1);

    let hits = lifecycle::list_filtered(&store, Some("michelin"), Some(TireCondition::New), None);
    assert!(hits.is_empty());

    let hits = lifecycle::list_filtered(&store, None, None, None);
    assert_eq!(hits.len(), 2);
}

#[test]
fn at_os_db_17_relocate_accepts_max_length_placement() {
    let mut store = TireStore::new_in_memory();
    let edit = session(Role::Edit);
    let long_location = "x".repeat(250);
    let long_position = "y".repeat(250);

    lifecycle::create(&edit, &mut store, tid("T1"), fields("a"), TimestampMs(10)).unwrap();
    // A placement that a full update accepts must also be accepted here.
    lifecycle::update(
        &edit,
        &mut store,
        &tid("T1"),
        TireFields {
            location: Some(long_location.clone()),
            ..TireFields::default()
        },
        TimestampMs(20),
    )
    .unwrap();
    lifecycle::relocate(
        &edit,
        &mut store,
        &tid("T1"),
        &long_location,
        &long_position,
        TimestampMs(30),
    )
    .unwrap();

    let r = store.get_tire(&tid("T1")).unwrap();
    assert_eq!(r.location, long_location);
    assert_eq!(r.position, long_position);
    let last = r.history.last().unwrap();
    assert_eq!(last.kind, AuditEventKind::Relocation);
    assert!(last.note.len() <= 256);
    assert!(last.note.starts_with("moved to "));
}
