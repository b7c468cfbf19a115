//! Single-file upload relay.
//!
//! Accepts one multipart file per request, stores it as a one-entry zip
//! archive named after a generated id and serves it back at `/file/{id}.zip`.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use routes::routes::routes;
pub use state::AppState;
