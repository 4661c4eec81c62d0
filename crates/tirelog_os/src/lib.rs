#![forbid(unsafe_code)]

pub mod authz;
pub mod error;
pub mod lifecycle;
pub mod transfer;

pub use error::{AuthError, OpError};
