//! Database models and queries for the micrograph store
//!
//! Both services open the store read-only; `init_database` exists for
//! provisioning a fresh store (schema only, no rows).

pub mod init;
pub mod models;
pub mod queries;

pub use init::*;
pub use models::*;
pub use queries::*;
