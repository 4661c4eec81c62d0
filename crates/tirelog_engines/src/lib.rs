#![forbid(unsafe_code)]

pub mod attachment;
pub mod credential;
