//! Core of the product parameter manager.
//!
//! Provides the typed page schema, header reconciliation and value coercion
//! for tabular imports, CSV/JSON import and export, backup snapshots, and a
//! database facade over pluggable key-value storage.

pub mod auth;
pub mod backup;
pub mod coercion;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod ids;
pub mod import;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod storage;
pub mod tabular;

pub use database::{Database, ImportReport};
pub use error::{ErrorKind, ParamError, Result};
