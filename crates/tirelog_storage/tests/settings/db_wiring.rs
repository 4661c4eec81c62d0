#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tirelog_storage::store::TireStore;
use tirelog_storage::StorageError;

fn temp_store_path(name: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(1);
    std::env::temp_dir().join(format!("tirelog-settings-test-{name}-{suffix}/store.json"))
}

#[test]
fn at_settings_db_01_put_then_get_roundtrips() {
    let mut s = TireStore::new_in_memory();
    assert!(s.get_setting("admin_hash").is_none());

    s.put_setting("admin_hash", "abc123").unwrap();
    assert_eq!(s.get_setting("admin_hash"), Some("abc123"));
}

#[test]
fn at_settings_db_02_put_overwrites_never_merges() {
    let mut s = TireStore::new_in_memory();
    s.put_setting("admin_hash", "first").unwrap();
    s.put_setting("admin_hash", "second").unwrap();

    assert_eq!(s.get_setting("admin_hash"), Some("second"));
}

#[test]
fn at_settings_db_03_delete_removes_key() {
    let mut s = TireStore::new_in_memory();
    s.put_setting("admin_hash", "abc").unwrap();

    assert!(s.delete_setting("admin_hash").unwrap());
    assert!(s.get_setting("admin_hash").is_none());
    assert!(!s.delete_setting("admin_hash").unwrap());
}

#[test]
fn at_settings_db_04_empty_key_is_rejected() {
    let mut s = TireStore::new_in_memory();
    match s.put_setting("  ", "abc") {
        Err(StorageError::Contract(_)) => {}
        other => panic!("expected contract violation, got {other:?}"),
    }
}

#[test]
fn at_settings_db_05_settings_survive_reopen() {
    let path = temp_store_path("reopen");
    {
        let mut s = TireStore::open(&path).unwrap();
        s.put_setting("admin_hash", "persisted").unwrap();
    }

    let s = TireStore::open(&path).unwrap();
    assert_eq!(s.get_setting("admin_hash"), Some("persisted"));
}
