mod admin;
mod auth;
mod content;
mod files;
mod settings;
mod share;

pub use admin::{admin_purge, health};
pub use auth::{current_user, login, logout};
pub use content::serve_content;
pub use files::{
    delete_file, empty_trash, get_file, list_deleted_files, list_files, permanent_delete_file,
    restore_file, share_file, update_file, upload_files,
};
pub use settings::{get_settings, update_settings};
pub use share::{add_shared_file, get_shared_file};
