//! OpenShelf Library Catalog
//!
//! A Rust implementation of the OpenShelf library catalog server,
//! providing a REST JSON API for browsing books, authors and genres,
//! and for tracking and renewing the individual copies patrons borrow.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
