#![forbid(unsafe_code)]

pub mod ops_cli;
