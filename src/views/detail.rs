//! Community detail: tabs, edit/delete dialogs, membership actions, chat input.
//!
//! DESIGN
//! ======
//! Two independent sub-states: the active tab and the dialog. The dialog is a
//! tagged union so "edit and delete open at once" cannot be represented. The
//! edit draft lives inside `DialogState::EditOpen` and is always seeded in
//! full from the active community, never merged with an earlier draft.
//!
//! Role checks only decide what to offer. Authorization is the API's job.

#[cfg(test)]
#[path = "detail_test.rs"]
mod detail_test;

use serde::Serialize;
use tracing::debug;

use super::Navigation;
use crate::net::types::{Category, ChatMessage, Community, CommunityDraft, CurrentUser, Rule};
use crate::state::community::CommunityStore;
use crate::state::error::StoreError;

// =============================================================================
// TYPES
// =============================================================================

/// Tabs on the detail screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetailTab {
    #[default]
    Posts,
    Chat,
    Members,
    Rules,
}

/// Scratch copy of a community's editable fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub is_private: bool,
    pub rules: Vec<Rule>,
    pub tags: Vec<String>,
}

impl EditDraft {
    #[must_use]
    pub fn from_community(community: &Community) -> Self {
        Self {
            name: community.name.clone(),
            description: community.description.clone(),
            category: community.category,
            is_private: community.is_private,
            rules: community.rules.clone(),
            tags: community.tags.clone(),
        }
    }

    #[must_use]
    pub fn to_draft(&self) -> CommunityDraft {
        CommunityDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            category: Some(self.category),
            is_private: self.is_private,
            rules: self.rules.clone(),
            tags: self.tags.clone(),
            avatar: None,
            cover_image: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Closed,
    EditOpen { community_id: String, draft: EditDraft },
    DeleteOpen { community_id: String },
}

/// Which membership and admin actions the screen should offer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemberActions {
    pub join: bool,
    pub leave: bool,
    pub edit: bool,
    pub delete: bool,
}

#[must_use]
pub fn is_admin(user: &CurrentUser, community: &Community) -> bool {
    community.is_creator(&user.id)
}

#[must_use]
pub fn is_member(user: &CurrentUser, community: &Community) -> bool {
    community.is_member(&user.id)
}

/// Join for outsiders, leave for members other than the creator, edit and
/// delete for the creator.
#[must_use]
pub fn member_actions(user: &CurrentUser, community: &Community) -> MemberActions {
    let admin = is_admin(user, community);
    let member = is_member(user, community);
    MemberActions { join: !member, leave: member && !admin, edit: admin, delete: admin }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Local UI state for one community detail screen.
#[derive(Clone, Debug, Default)]
pub struct DetailView {
    tab: DetailTab,
    dialog: DialogState,
    message_input: String,
    community_id: Option<String>,
}

impl DetailView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
    }

    #[must_use]
    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    #[must_use]
    pub fn message_input(&self) -> &str {
        &self.message_input
    }

    pub fn set_message_input(&mut self, text: impl Into<String>) {
        self.message_input = text.into();
    }

    /// Follow the store's active community. When it changes, an open edit
    /// dialog is reseeded in full from the new one, a delete dialog for the
    /// old one closes, and the chat input is cleared.
    pub fn sync_active(&mut self, active: Option<&Community>) {
        let id = active.map(|c| c.id.clone());
        if id == self.community_id {
            return;
        }
        self.community_id = id;
        self.message_input.clear();
        self.dialog = match (&self.dialog, active) {
            (DialogState::EditOpen { .. }, Some(community)) => {
                DialogState::EditOpen { community_id: community.id.clone(), draft: EditDraft::from_community(community) }
            }
            _ => DialogState::Closed,
        };
    }

    /// Open the edit dialog seeded from `active`. Returns `false` when there
    /// is nothing to edit.
    pub fn open_edit(&mut self, active: Option<&Community>) -> bool {
        let Some(community) = active else {
            return false;
        };
        self.community_id = Some(community.id.clone());
        self.dialog = DialogState::EditOpen {
            community_id: community.id.clone(),
            draft: EditDraft::from_community(community),
        };
        true
    }

    #[must_use]
    pub fn edit_draft(&self) -> Option<&EditDraft> {
        match &self.dialog {
            DialogState::EditOpen { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.dialog {
            DialogState::EditOpen { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Open the delete confirmation. Returns `false` when nothing is active.
    pub fn open_delete(&mut self, active: Option<&Community>) -> bool {
        let Some(community) = active else {
            return false;
        };
        self.community_id = Some(community.id.clone());
        self.dialog = DialogState::DeleteOpen { community_id: community.id.clone() };
        true
    }

    pub fn close_dialog(&mut self) {
        self.dialog = DialogState::Closed;
    }

    /// Submit the edit draft. The dialog closes whatever the outcome; a
    /// failure is returned and also sits in the store's error slot.
    ///
    /// Returns `None` when the edit dialog is not open.
    pub async fn submit_edit(&mut self, store: &CommunityStore) -> Option<Result<Community, StoreError>> {
        let DialogState::EditOpen { community_id, draft } = std::mem::take(&mut self.dialog) else {
            return None;
        };
        debug!(%community_id, "submitting community edit");
        Some(
            store
                .update_community(&community_id, &draft.to_draft())
                .await,
        )
    }

    /// Confirm deletion. Navigation back to the list is returned only when
    /// the delete succeeds; on failure the dialog closes, the user stays on
    /// the detail screen and the error is returned (and sits in the store's
    /// error slot).
    ///
    /// Returns `None` when the delete dialog is not open.
    pub async fn confirm_delete(&mut self, store: &CommunityStore) -> Option<Result<Navigation, StoreError>> {
        let DialogState::DeleteOpen { community_id } = std::mem::take(&mut self.dialog) else {
            return None;
        };
        debug!(%community_id, "confirming community delete");
        let result = store.delete_community(&community_id).await;
        if result.is_ok() {
            self.community_id = None;
        }
        Some(result.map(|()| Navigation::CommunitiesList))
    }

    /// Send the chat input to the active community.
    ///
    /// Blank input is a no-op returning `Ok(None)`. Otherwise the input is
    /// cleared once the send resolves, whether it succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns the store failure for the send.
    pub async fn submit_message(&mut self, store: &CommunityStore) -> Result<Option<ChatMessage>, StoreError> {
        let content = self.message_input.trim().to_string();
        if content.is_empty() {
            return Ok(None);
        }
        let Some(id) = store.snapshot().active.map(|c| c.id) else {
            return Ok(None);
        };
        let result = store.send_community_message(&id, &content).await;
        self.message_input.clear();
        result.map(Some)
    }
}
