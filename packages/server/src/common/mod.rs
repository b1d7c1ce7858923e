// Common types and utilities shared across the application

pub mod paths;
pub mod slug;

pub use paths::DataPaths;
pub use slug::{lead_key, lead_slug, normalize, query_slug};
