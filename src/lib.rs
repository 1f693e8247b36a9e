//! Eventimg - event image ingestion
//!
//! This library crate exposes the ingestion core, configuration and the HTTP
//! server for the binary and for integration testing.

pub mod config;
pub mod images;
pub mod server;
