// Exports all the modules for use in the application

pub mod models;
pub mod schema;
pub mod services;
pub mod config;
pub mod middleware;
pub mod logger;
pub mod activity;
pub mod handlers;

// Re-export common types
pub use crate::config::ApiError;
pub use crate::config::AppConfig;
pub use crate::config::DbPool;
pub use crate::middleware::AuthContext;
pub use crate::models::User;
