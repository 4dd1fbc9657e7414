//! Client-side state owned by the community store.
//!
//! DESIGN
//! ======
//! `community` holds the canonical list, the active community, its posts and
//! chat transcript. `error` is the taxonomy every store operation reports in.

pub mod community;
pub mod error;

#[cfg(test)]
pub mod test_helpers;
