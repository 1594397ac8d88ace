//! # HTTP Server Module
//!
//! Axum transport for the domain operations.
//!
//! # Endpoints
//!
//! - `/health` - Health check with store counts
//! - `/authors` - Create and list authors
//! - `/authors/{id}` - Fetch one author, optionally with books
//! - `/authors/{id}/books` - Create a book for an author
//!
//! Failures are returned as RFC 7807 problem documents.

pub mod author_routes;
pub mod config;
pub mod health_routes;
pub mod problem;
pub mod server;

pub use author_routes::AuthorsState;
pub use config::HttpServerConfig;
pub use problem::ProblemDetails;
pub use server::HttpServer;
