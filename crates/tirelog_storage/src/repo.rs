#![forbid(unsafe_code)]

use tirelog_contracts::tire::{TireId, TireRecord};

use crate::store::{StorageError, TireStore};

/// Typed repository interface for the tires table. The lifecycle layer is
/// generic over this seam.
pub trait TireRepo {
    fn put_tire(&mut self, record: TireRecord) -> Result<(), StorageError>;
    fn get_tire(&self, id: &TireId) -> Option<&TireRecord>;
    fn tire_count(&self) -> usize;
    fn all_tires(&self) -> Vec<&TireRecord>;
    fn tires_by_updated_desc(&self) -> Vec<&TireRecord>;
    fn delete_tire(&mut self, id: &TireId) -> Result<bool, StorageError>;
    /// Raw upsert for bulk import: no permission check, no audit event.
    fn replace_tire_unchecked(&mut self, record: TireRecord) -> Result<(), StorageError>;
}

/// Typed repository interface for the settings table (single-key
/// configuration, e.g. the credential digest).
pub trait SettingsRepo {
    fn put_setting(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get_setting(&self, key: &str) -> Option<&str>;
    fn delete_setting(&mut self, key: &str) -> Result<bool, StorageError>;
}

impl TireRepo for TireStore {
    fn put_tire(&mut self, record: TireRecord) -> Result<(), StorageError> {
        TireStore::put_tire(self, record)
    }

    fn get_tire(&self, id: &TireId) -> Option<&TireRecord> {
        TireStore::get_tire(self, id)
    }

    fn tire_count(&self) -> usize {
        TireStore::tire_count(self)
    }

    fn all_tires(&self) -> Vec<&TireRecord> {
        TireStore::all_tires(self)
    }

    fn tires_by_updated_desc(&self) -> Vec<&TireRecord> {
        TireStore::tires_by_updated_desc(self)
    }

    fn delete_tire(&mut self, id: &TireId) -> Result<bool, StorageError> {
        TireStore::delete_tire(self, id)
    }

    fn replace_tire_unchecked(&mut self, record: TireRecord) -> Result<(), StorageError> {
        TireStore::replace_tire_unchecked(self, record)
    }
}

impl SettingsRepo for TireStore {
    fn put_setting(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        TireStore::put_setting(self, key, value)
    }

    fn get_setting(&self, key: &str) -> Option<&str> {
        TireStore::get_setting(self, key)
    }

    fn delete_setting(&mut self, key: &str) -> Result<bool, StorageError> {
        TireStore::delete_setting(self, key)
    }
}
