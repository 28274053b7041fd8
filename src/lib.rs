//! fileos - A personal file-storage service with a retro desktop model
//!
//! This crate provides:
//! - A REST API for uploading, arranging, sharing and recycling files
//! - redb embedded database for metadata, users, sessions and settings
//! - A local upload directory for file bytes
//! - The desktop model (windows, icons, viewers, context menus) and a typed
//!   API client that drives it

pub mod api;
pub mod client;
pub mod config;
pub mod desktop;
pub mod object_store;
pub mod storage;

use std::sync::Arc;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn object_store::ObjectStore>,
}
