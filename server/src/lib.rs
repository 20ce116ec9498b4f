//! Catalog Server Library
//!
//! HTTP front end for the catalog index: configuration, routes and the
//! mapping of index errors onto responses.

pub mod api;
pub mod config;
pub mod error;

pub use api::{router, AppState};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
