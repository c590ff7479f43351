//! API Module
//!
//! HTTP handlers and routing for the cache and resource endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
