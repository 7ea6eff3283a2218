//! Taskdesk terminal client library.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod data;
pub mod net;
pub mod retry;
pub mod ui;
