//! Taskdesk server library.
//!
//! Exposes the REST API, its task stores and the server bootstrap for use in
//! tests and embedding.

pub mod api;
pub mod config;
pub mod server;
pub mod store;
