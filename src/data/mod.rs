//! Data layer module
//!
//! Handles persistence for the normalized cache:
//! - SQLite record storage with total-replacement upserts
//! - Committed-write change notifications
//! - Entity normalization into per-identity records

mod database;
mod models;
mod normalize;

pub use database::{Database, RecordChange};
pub use models::*;
pub use normalize::{normalize_account, normalize_status, normalize_timeline};
