//! Wire types for the file storage backend.
//!
//! This crate contains the serde-serializable request and response bodies
//! exchanged with the backend's REST API. Field names follow the backend's
//! snake_case JSON exactly.
//!
//! Types in this crate are pure data. Session handling, retries and
//! authorization live in `filedash`.

pub mod admin;
pub mod auth;
pub mod files;

pub use admin::*;
pub use auth::*;
pub use files::*;
