#![forbid(unsafe_code)]

use tirelog_contracts::artifact::{ArtifactMediaType, ImageArtifact};
use tirelog_contracts::auth::{Role, Session};
use tirelog_contracts::tire::{TireFields, TireId};
use tirelog_contracts::TimestampMs;
use tirelog_os::error::OpError;
use tirelog_os::{lifecycle, transfer};
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

fn populated_store() -> TireStore {
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
    lifecycle::create(&edit, &mut store, tid("T2"), TireFields::default(), TimestampMs(20))
        .unwrap();
    lifecycle::relocate(&edit, &mut store, &tid("T1"), "warehouse", "E3", TimestampMs(30))
        .unwrap();
    let sig = ImageArtifact::v1(ArtifactMediaType::Png, 4, 4, "aGk=".to_string()).unwrap();
    lifecycle::attach_signature(&edit, &mut store, &tid("T2"), sig, TimestampMs(40)).unwrap();
    store
}

#[test]
fn at_transfer_db_01_export_import_roundtrip_is_identity() {
    let source = populated_store();
    let exported = transfer::export_json(&source).unwrap();

    let mut target = TireStore::new_in_memory();
    let count = transfer::import_json(&mut target, &exported).unwrap();

    assert_eq!(count, 2);
    assert_eq!(target.tire_count(), source.tire_count());
    for record in source.all_tires() {
        let restored = target.get_tire(&record.id).expect("record must survive");
        assert_eq!(restored, record);
    }
}

#[test]
fn at_transfer_db_02_export_document_has_tires_shape() {
    let source = populated_store();
    let raw = transfer::export_json(&source).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let tires = value
        .get("tires")
        .and_then(|t| t.as_array())
        .expect("document must carry a tires array");
    assert_eq!(tires.len(), 2);
    assert!(tires.iter().all(|t| t.get("id").is_some()));
}

#[test]
fn at_transfer_db_03_import_rejects_unparseable_document() {
    let mut store = TireStore::new_in_memory();
    match transfer::import_json(&mut store, "not json at all") {
        Err(OpError::Format(_)) => {}
        other => panic!("expected format error, got {other:?}"),
    }
    match transfer::import_json(&mut store, r#"{"wheels": []}"#) {
        Err(OpError::Format(_)) => {}
        other => panic!("expected format error, got {other:?}"),
    }
    assert_eq!(store.tire_count(), 0);
}

#[test]
fn at_transfer_db_04_import_is_all_or_nothing() {
    let source = populated_store();
    let mut doc = transfer::export_document(&source);
    // Corrupt the second record so validation fails after a valid first one.
    doc.tires[1].history.clear();
    let raw = serde_json::to_string(&doc).unwrap();

    let mut target = TireStore::new_in_memory();
    match transfer::import_json(&mut target, &raw) {
        Err(OpError::Contract(_)) => {}
        other => panic!("expected contract violation, got {other:?}"),
    }
    assert_eq!(target.tire_count(), 0);
}

#[test]
fn at_transfer_db_05_import_bypasses_roles_and_appends_no_audit_events() {
    let source = populated_store();
    let exported = transfer::export_json(&source).unwrap();
    let expected_events: usize = source.all_tires().iter().map(|r| r.history.len()).sum();

    // No session, no role: import is deliberately unauthenticated.
    let mut target = TireStore::new_in_memory();
    transfer::import_json(&mut target, &exported).unwrap();

    let restored_events: usize = target.all_tires().iter().map(|r| r.history.len()).sum();
    assert_eq!(restored_events, expected_events);
}

#[test]
fn at_transfer_db_06_import_overwrites_existing_ids() {
    let source = populated_store();
    let exported = transfer::export_json(&source).unwrap();

    let mut target = TireStore::new_in_memory();
    lifecycle::create(
        &session(Role::Add),
        &mut target,
        tid("T1"),
        TireFields {
            brand: Some("stale".to_string()),
            ..TireFields::default()
        },
        TimestampMs(5),
    )
    .unwrap();

    transfer::import_json(&mut target, &exported).unwrap();
    assert_eq!(target.get_tire(&tid("T1")).unwrap().brand, "Michelin");
}
