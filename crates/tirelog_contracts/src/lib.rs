#![forbid(unsafe_code)]

pub mod artifact;
pub mod auth;
pub mod common;
pub mod tire;

pub use common::{ContractViolation, SchemaVersion, TimestampMs, Validate};
