pub mod auth;
pub mod dto;
mod handlers;
pub mod response;
mod routes;

pub use routes::create_router;
