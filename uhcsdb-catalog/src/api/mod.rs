//! HTTP handlers for uhcsdb-catalog

pub mod assets;
pub mod entries;
pub mod health;
pub mod micrograph;
pub mod visual_query;
pub mod visualize;

pub use assets::static_routes;
pub use entries::{all_entries, entries, favorites, index};
pub use health::health_routes;
pub use micrograph::show_entry;
pub use visual_query::visual_query;
pub use visualize::visualize;
