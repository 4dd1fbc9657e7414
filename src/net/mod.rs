//! Networking modules for the community REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the shared data model and wire schema, `api` defines the
//! gateway contract the store calls through, and `http` implements that
//! contract over reqwest.

pub mod api;
pub mod http;
pub mod types;
