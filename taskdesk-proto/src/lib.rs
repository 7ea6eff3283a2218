//! Shared task model, wire types and validation rules for `Taskdesk`.
//!
//! Both the server and the terminal client depend on this crate so that the
//! JSON shapes and the field rules stay identical on the two ends.

pub mod task;
pub mod validate;
pub mod wire;
