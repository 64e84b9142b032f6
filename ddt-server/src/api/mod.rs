//! HTTP API handlers for ddt-server

pub mod auth;
pub mod dashboard;
pub mod drift;
pub mod events;
pub mod health;
pub mod sessions;
pub mod tabs;
pub mod whitelist;

pub use auth::{auth_middleware, AuthUser};
pub use health::health_routes;
