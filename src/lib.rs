//! # pethaven
//!
//! Client-side core for the PetHaven community feature: the typed API
//! gateway, the community store that owns the canonical list/detail/chat
//! state, and the view controllers (list, detail, create) that read from the
//! store and issue intents against it.
//!
//! Data flows one way. Views read store snapshots and call store operations;
//! the store calls the API and republishes state. Views never touch the
//! network directly.

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod views;
