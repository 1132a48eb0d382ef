//! Types exchanged between the catalog and the explorer
//!
//! The catalog is a client of exactly two explorer endpoints: `GET /health`
//! and `POST /sessions`. Everything else the explorer serves is consumed by
//! the browser directly.

pub mod types;

pub use types::{
    CreateSessionRequest, CreateSessionResponse, ErrorBody, ErrorDetail, HealthResponse,
    VISUALIZE_APP_PATH,
};
