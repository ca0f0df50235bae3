//! Nationhood Server: JSON HTTP API over the nationhood services.

pub mod api;
pub mod config;
pub mod error;

pub use api::{AppState, build_router};
pub use config::Args;
pub use error::ApiError;
