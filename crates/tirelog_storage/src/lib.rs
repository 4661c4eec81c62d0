#![forbid(unsafe_code)]

pub mod repo;
pub mod store;

pub use repo::{SettingsRepo, TireRepo};
pub use store::{StorageError, TireStore};
