#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tirelog_contracts::tire::{TireId, TireRecord};
use tirelog_contracts::{ContractViolation, Validate};

const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StorageError {
    Io { path: PathBuf, source: io::Error },
    Encode(serde_json::Error),
    Decode { path: PathBuf, source: serde_json::Error },
    SchemaMismatch { found: u32, expected: u32 },
    Contract(ContractViolation),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "storage io error at {}: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "storage encode error: {err}"),
            Self::Decode { path, source } => {
                write!(f, "storage decode error at {}: {source}", path.display())
            }
            Self::SchemaMismatch { found, expected } => {
                write!(f, "store schema version {found} does not match expected {expected}")
            }
            Self::Contract(v) => write!(f, "storage contract violation: {v}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::Contract(v)
    }
}

/// A record plus the write sequence of its latest commit. The sequence is
/// the tiebreak for chronological scans when two records share an
/// `updated_at` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTire {
    pub seq: u64,
    pub record: TireRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    next_seq: u64,
    tires: Vec<StoredTire>,
    settings: BTreeMap<String, String>,
}

/// The single local store. Two typed tables (tires, settings) held in
/// memory and committed as one JSON document per mutation. Every mutating
/// operation commits to disk before touching the in-memory tables, so a
/// failed commit leaves the observable state untouched.
#[derive(Debug)]
pub struct TireStore {
    path: Option<PathBuf>,
    next_seq: u64,
    tires: BTreeMap<TireId, StoredTire>,
    settings: BTreeMap<String, String>,
}

impl TireStore {
    pub fn new_in_memory() -> Self {
        Self {
            path: None,
            next_seq: 1,
            tires: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }

    /// Opens (or creates) the store at `path`. Performs the schema check
    /// required before any other operation is invoked.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path: Some(path),
                next_seq: 1,
                tires: BTreeMap::new(),
                settings: BTreeMap::new(),
            });
        }
        let raw = fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let doc: StoreDocument =
            serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
                path: path.clone(),
                source,
            })?;
        if doc.schema_version != STORE_SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                found: doc.schema_version,
                expected: STORE_SCHEMA_VERSION,
            });
        }
        let mut tires = BTreeMap::new();
        let mut max_seq = 0u64;
        for stored in doc.tires {
            stored.record.validate()?;
            max_seq = max_seq.max(stored.seq);
            tires.insert(stored.record.id.clone(), stored);
        }
        Ok(Self {
            path: Some(path),
            next_seq: doc.next_seq.max(max_seq + 1),
            tires,
            settings: doc.settings,
        })
    }

    pub fn put_tire(&mut self, record: TireRecord) -> Result<(), StorageError> {
        record.validate()?;
        let stored = StoredTire {
            seq: self.next_seq,
            record,
        };
        let mut tires = self.tires.clone();
        tires.insert(stored.record.id.clone(), stored);
        self.commit(&tires, &self.settings, self.next_seq + 1)?;
        self.tires = tires;
        self.next_seq += 1;
        Ok(())
    }

    pub fn get_tire(&self, id: &TireId) -> Option<&TireRecord> {
        self.tires.get(id).map(|s| &s.record)
    }

    pub fn tire_count(&self) -> usize {
        self.tires.len()
    }

    /// Stable key-order scan.
    pub fn all_tires(&self) -> Vec<&TireRecord> {
        self.tires.values().map(|s| &s.record).collect()
    }

    /// Secondary index scan: `updated_at` descending, equal timestamps
    /// resolved by ascending write sequence (insertion order).
    pub fn tires_by_updated_desc(&self) -> Vec<&TireRecord> {
        let mut rows: Vec<&StoredTire> = self.tires.values().collect();
        rows.sort_by(|a, b| {
            b.record
                .updated_at
                .cmp(&a.record.updated_at)
                .then(a.seq.cmp(&b.seq))
        });
        rows.into_iter().map(|s| &s.record).collect()
    }

    /// Returns whether a record was removed. No tombstone is kept.
    pub fn delete_tire(&mut self, id: &TireId) -> Result<bool, StorageError> {
        if !self.tires.contains_key(id) {
            return Ok(false);
        }
        let mut tires = self.tires.clone();
        tires.remove(id);
        self.commit(&tires, &self.settings, self.next_seq)?;
        self.tires = tires;
        Ok(true)
    }

    /// Raw upsert used by bulk import. Bypasses the lifecycle layer
    /// entirely: no permission check, no audit event. Contract validation
    /// still applies.
    pub fn replace_tire_unchecked(&mut self, record: TireRecord) -> Result<(), StorageError> {
        self.put_tire(record)
    }

    pub fn put_setting(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::Contract(ContractViolation::InvalidValue {
                field: "settings.key",
                reason: "must not be empty",
            }));
        }
        let mut settings = self.settings.clone();
        settings.insert(key.to_string(), value.to_string());
        self.commit(&self.tires, &settings, self.next_seq)?;
        self.settings = settings;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn delete_setting(&mut self, key: &str) -> Result<bool, StorageError> {
        if !self.settings.contains_key(key) {
            return Ok(false);
        }
        let mut settings = self.settings.clone();
        settings.remove(key);
        self.commit(&self.tires, &settings, self.next_seq)?;
        self.settings = settings;
        Ok(true)
    }

    fn commit(
        &self,
        tires: &BTreeMap<TireId, StoredTire>,
        settings: &BTreeMap<String, String>,
        next_seq: u64,
    ) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let doc = StoreDocument {
            schema_version: STORE_SCHEMA_VERSION,
            next_seq,
            tires: tires.values().cloned().collect(),
            settings: settings.clone(),
        };
        let serialized = serde_json::to_vec_pretty(&doc).map_err(StorageError::Encode)?;
        atomic_write(path, &serialized)
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    fs::write(&tmp, data).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}
