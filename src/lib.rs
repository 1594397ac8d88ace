//! authors-api - authors and their books over HTTP
//!
//! Layers, outermost first:
//! - `cli`: config file and the `init` / `serve` commands
//! - `http_server`: axum routes and RFC 7807 problem responses
//! - `domain`: validation and uniqueness rules
//! - `store`: transactional catalog with commit-time constraint checks
//! - `wal`: append-only log that makes commits durable

pub mod cli;
pub mod domain;
pub mod http_server;
pub mod observability;
pub mod store;
pub mod wal;
