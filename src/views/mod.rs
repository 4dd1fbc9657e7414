//! View controllers for the community screens.
//!
//! ARCHITECTURE
//! ============
//! Each controller owns only its local UI state (query, tab, dialog, draft,
//! chat input) as one explicit struct. Controllers read store snapshots and
//! call store operations; none of them touches the network directly.

pub mod create;
pub mod detail;
pub mod list;

/// Routing intent handed to the external navigation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Leave the current screen for the communities list.
    CommunitiesList,
}
