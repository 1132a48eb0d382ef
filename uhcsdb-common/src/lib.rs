//! # UHCSDB Common Library
//!
//! Shared code for the UHCSDB catalog and explorer services:
//! - Settings loading (TOML file + compiled defaults)
//! - Database models and queries for the micrograph store
//! - Request/response types exchanged between the two services
//! - Common error type

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use config::Settings;
pub use error::{Error, Result};

/// Reserved value marking a missing numeric field.
///
/// Plot channels are plain JSON numbers with no NaN, so the explorer flattens
/// missing metadata to this value when it builds its dataset.
pub const SENTINEL: f64 = -9999.0;
