//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the proxy, access and service endpoints
//! - Video proxy: playlist rewriting and media passthrough
//! - Access check and page guard endpoints
//! - Request logging with request ids
//! - CORS middleware

pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod routes;

pub use routes::create_router;
