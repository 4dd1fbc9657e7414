//! Community store: canonical client-side view of communities.
//!
//! DESIGN
//! ======
//! The store owns the community list, the single active community, and the
//! active community's posts and chat transcript. Views read snapshots or
//! subscribe to the `watch` channel; every change goes through a store
//! operation. Each operation awaits the gateway first and then mutates state
//! synchronously inside `send_modify`, so two operations in flight on the
//! same store never interleave half-applied updates.
//!
//! STALENESS
//! =========
//! `get_community` records its id as the pending navigation target before it
//! awaits. Posts and chat for the pending target are held in side buffers and
//! only become visible when that get lands; a failed get drops them. The
//! visible `posts` and `chat` always belong to the active community. Late
//! responses for a community that is neither pending nor active are dropped.
//!
//! ERROR HANDLING
//! ==============
//! API failures and membership precondition failures land in the single
//! `last_error` slot and are also returned. Client-side validation failures
//! (missing draft fields, empty chat message) are returned to the caller only
//! and never touch the slot. A failed operation leaves loaded state as is.

#[cfg(test)]
#[path = "community_test.rs"]
mod community_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::StoreError;
use crate::net::api::{ApiError, CommunityApi};
use crate::net::types::{ChatMessage, Community, CommunityDraft, CurrentUser, Pagination, Post, Role};

// =============================================================================
// STATE
// =============================================================================

/// Snapshot of everything the store publishes.
#[derive(Clone, Debug, Default)]
pub struct CommunityState {
    /// Shared so views can memoize on pointer identity. Every list mutation
    /// yields a fresh allocation while a view still holds the old one.
    pub communities: Arc<Vec<Community>>,
    pub pagination: Pagination,
    pub active: Option<Community>,
    pub posts: Vec<Post>,
    pub chat: Vec<ChatMessage>,
    pub last_error: Option<StoreError>,
    /// Community requested by the latest `get_community` still in flight.
    pub pending_id: Option<String>,
    posts_for: Option<String>,
    chat_for: Option<String>,
    /// Loaded for `pending_id` before its get resolved.
    pending_posts: Option<Vec<Post>>,
    pending_chat: Option<Vec<ChatMessage>>,
}

/// Where a posts or chat response for some id goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Pending,
    Active,
    Stale,
}

impl CommunityState {
    /// Community the detail view is showing or navigating to.
    #[must_use]
    pub fn focus_id(&self) -> Option<&str> {
        self.pending_id
            .as_deref()
            .or_else(|| self.active.as_ref().map(|c| c.id.as_str()))
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.id.as_str())
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Community> {
        self.active
            .as_ref()
            .filter(|c| c.id == id)
            .or_else(|| self.communities.iter().find(|c| c.id == id))
    }

    /// Replace the list entry and the active community with the server's copy.
    fn apply_community(&mut self, id: &str, community: &Community) {
        if let Some(entry) = Arc::make_mut(&mut self.communities)
            .iter_mut()
            .find(|c| c.id == id)
        {
            *entry = community.clone();
        }
        if self.active_id() == Some(id) {
            self.active = Some(community.clone());
        }
    }

    fn slot_for(&self, id: &str) -> Slot {
        if self.pending_id.as_deref() == Some(id) {
            Slot::Pending
        } else if self.active_id() == Some(id) {
            Slot::Active
        } else {
            Slot::Stale
        }
    }

    /// Record a new navigation target. Buffers held for a different target
    /// are dropped.
    fn begin_navigation(&mut self, id: &str) {
        if self.pending_id.as_deref() != Some(id) {
            self.pending_posts = None;
            self.pending_chat = None;
        }
        self.pending_id = Some(id.to_string());
    }

    fn abandon_navigation(&mut self) {
        self.pending_id = None;
        self.pending_posts = None;
        self.pending_chat = None;
    }

    /// Make `community` active, promoting anything buffered for it.
    fn set_active(&mut self, community: Community) {
        let id = community.id.clone();
        if let Some(posts) = self.pending_posts.take() {
            self.posts = posts;
            self.posts_for = Some(id.clone());
        } else if self.posts_for.as_deref() != Some(id.as_str()) {
            self.posts.clear();
            self.posts_for = None;
        }
        if let Some(chat) = self.pending_chat.take() {
            self.chat = chat;
            self.chat_for = Some(id.clone());
        } else if self.chat_for.as_deref() != Some(id.as_str()) {
            self.chat.clear();
            self.chat_for = None;
        }
        self.active = Some(community);
    }

    fn clear_active(&mut self) {
        self.active = None;
        self.posts.clear();
        self.chat.clear();
        self.posts_for = None;
        self.chat_for = None;
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct CommunityStore {
    api: Arc<dyn CommunityApi>,
    user: CurrentUser,
    state: watch::Sender<CommunityState>,
}

impl CommunityStore {
    #[must_use]
    pub fn new(api: Arc<dyn CommunityApi>, user: CurrentUser) -> Self {
        Self { api, user, state: watch::Sender::new(CommunityState::default()) }
    }

    #[must_use]
    pub fn current_user(&self) -> &CurrentUser {
        &self.user
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CommunityState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes whenever the store publishes a change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CommunityState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<StoreError> {
        self.state.borrow().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.last_error.take().is_some());
    }

    /// The current user's role in the active community, if any.
    #[must_use]
    pub fn active_role(&self) -> Option<Role> {
        let state = self.state.borrow();
        state
            .active
            .as_ref()
            .and_then(|c| c.member(&self.user.id))
            .map(|m| m.role)
    }

    fn record(&self, err: StoreError) -> StoreError {
        warn!(error = %err, "community operation failed");
        self.state
            .send_modify(|s| s.last_error = Some(err.clone()));
        err
    }

    fn fail(&self, err: ApiError) -> StoreError {
        self.record(StoreError::from(err))
    }

    // -------------------------------------------------------------------------
    // LIST
    // -------------------------------------------------------------------------

    /// Load the first page of communities.
    ///
    /// # Errors
    ///
    /// Returns the API failure; the previous list stays in place.
    pub async fn list_communities(&self) -> Result<(Arc<Vec<Community>>, Pagination), StoreError> {
        self.list_communities_page(1).await
    }

    /// Load one page, replacing list and pagination wholesale.
    ///
    /// # Errors
    ///
    /// Returns the API failure; the previous list stays in place.
    pub async fn list_communities_page(&self, page: u32) -> Result<(Arc<Vec<Community>>, Pagination), StoreError> {
        debug!(page, "listing communities");
        let result = self
            .api
            .list_communities(page.max(1))
            .await
            .map_err(|e| self.fail(e))?;

        let communities = Arc::new(result.communities);
        let pagination = result.pagination;
        self.state.send_modify(|s| {
            s.communities = Arc::clone(&communities);
            s.pagination = pagination;
        });
        info!(count = communities.len(), page = pagination.page, "community list loaded");
        Ok((communities, pagination))
    }

    // -------------------------------------------------------------------------
    // DETAIL
    // -------------------------------------------------------------------------

    /// Navigate to a community and make it active.
    ///
    /// # Errors
    ///
    /// On failure the previous active community stays in place along with its
    /// posts and chat. The error is recorded unless a newer navigation has
    /// already replaced this one.
    pub async fn get_community(&self, id: &str) -> Result<Community, StoreError> {
        self.state.send_modify(|s| s.begin_navigation(id));

        match self.api.get_community(id).await {
            Ok(community) => {
                let applied = self.state.send_if_modified(|s| {
                    if s.pending_id.as_deref() != Some(id) {
                        return false;
                    }
                    s.pending_id = None;
                    s.set_active(community.clone());
                    true
                });
                if applied {
                    if !community.creator_is_admin() {
                        warn!(community_id = %id, "creator missing from admin members");
                    }
                    info!(community_id = %id, "active community loaded");
                } else {
                    debug!(community_id = %id, "discarding stale community response");
                }
                Ok(community)
            }
            Err(err) => {
                let current = self.state.send_if_modified(|s| {
                    if s.pending_id.as_deref() != Some(id) {
                        return false;
                    }
                    s.abandon_navigation();
                    true
                });
                if current {
                    Err(self.fail(err))
                } else {
                    debug!(community_id = %id, error = %err, "superseded navigation failed; not recorded");
                    Err(StoreError::from(err))
                }
            }
        }
    }

    /// Load posts for `id`. Shown when `id` is active, held back while it is
    /// the pending navigation target, dropped otherwise.
    ///
    /// # Errors
    ///
    /// Returns the API failure; loaded posts stay in place.
    pub async fn get_community_posts(&self, id: &str) -> Result<Vec<Post>, StoreError> {
        let posts = self
            .api
            .community_posts(id)
            .await
            .map_err(|e| self.fail(e))?;

        let mut slot = Slot::Stale;
        self.state.send_if_modified(|s| {
            slot = s.slot_for(id);
            match slot {
                Slot::Pending => s.pending_posts = Some(posts.clone()),
                Slot::Active => {
                    s.posts = posts.clone();
                    s.posts_for = Some(id.to_string());
                }
                Slot::Stale => {}
            }
            slot == Slot::Active
        });
        match slot {
            Slot::Pending => debug!(community_id = %id, "holding posts until community loads"),
            Slot::Stale => debug!(community_id = %id, "discarding stale posts response"),
            Slot::Active => {}
        }
        Ok(posts)
    }

    /// Load the chat transcript for `id`, routed like posts.
    ///
    /// # Errors
    ///
    /// Returns the API failure; the loaded transcript stays in place.
    pub async fn get_community_chat(&self, id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let chat = self
            .api
            .community_chat(id)
            .await
            .map_err(|e| self.fail(e))?;

        let mut slot = Slot::Stale;
        self.state.send_if_modified(|s| {
            slot = s.slot_for(id);
            match slot {
                Slot::Pending => s.pending_chat = Some(chat.clone()),
                Slot::Active => {
                    s.chat = chat.clone();
                    s.chat_for = Some(id.to_string());
                }
                Slot::Stale => {}
            }
            slot == Slot::Active
        });
        match slot {
            Slot::Pending => debug!(community_id = %id, "holding chat until community loads"),
            Slot::Stale => debug!(community_id = %id, "discarding stale chat response"),
            Slot::Active => {}
        }
        Ok(chat)
    }

    // -------------------------------------------------------------------------
    // MUTATIONS
    // -------------------------------------------------------------------------

    /// Create a community and append it to the list. The active community is
    /// left alone.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] before any network call when a
    /// required field is empty; otherwise the recorded API failure.
    pub async fn create_community(&self, draft: &CommunityDraft) -> Result<Community, StoreError> {
        draft.validate().map_err(StoreError::ValidationFailed)?;
        let draft = draft.normalized();

        let created = self
            .api
            .create_community(&draft)
            .await
            .map_err(|e| self.fail(e))?;

        self.state.send_modify(|s| {
            Arc::make_mut(&mut s.communities).push(created.clone());
        });
        info!(community_id = %created.id, name = %created.name, "community created");
        Ok(created)
    }

    /// Update a community, replacing the list entry and (when active) the
    /// active community with the server's result.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] before any network call when a
    /// required field is empty; otherwise the recorded API failure.
    pub async fn update_community(&self, id: &str, draft: &CommunityDraft) -> Result<Community, StoreError> {
        draft.validate().map_err(StoreError::ValidationFailed)?;
        let draft = draft.normalized();

        let updated = self
            .api
            .update_community(id, &draft)
            .await
            .map_err(|e| self.fail(e))?;

        self.state
            .send_modify(|s| s.apply_community(id, &updated));
        info!(community_id = %id, "community updated");
        Ok(updated)
    }

    /// Delete a community. Clears the active community with its posts and chat
    /// when it was the one deleted.
    ///
    /// # Errors
    ///
    /// Returns the recorded API failure; nothing is removed locally.
    pub async fn delete_community(&self, id: &str) -> Result<(), StoreError> {
        self.api
            .delete_community(id)
            .await
            .map_err(|e| self.fail(e))?;

        self.state.send_modify(|s| {
            if s.communities.iter().any(|c| c.id == id) {
                Arc::make_mut(&mut s.communities).retain(|c| c.id != id);
            }
            if s.active_id() == Some(id) {
                s.clear_active();
            }
            if s.pending_id.as_deref() == Some(id) {
                s.pending_id = None;
            }
        });
        info!(community_id = %id, "community deleted");
        Ok(())
    }

    /// Join as the current user.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyMember`] when the locally known member list
    /// already has the user; otherwise the API failure. Both are recorded.
    pub async fn join_community(&self, id: &str) -> Result<Community, StoreError> {
        let already = self
            .state
            .borrow()
            .find(id)
            .is_some_and(|c| c.is_member(&self.user.id));
        if already {
            return Err(self.record(StoreError::AlreadyMember));
        }

        let community = self
            .api
            .join_community(id)
            .await
            .map_err(|e| self.fail(e))?;

        if !community.is_member(&self.user.id) {
            warn!(community_id = %id, "join succeeded but user missing from returned members");
        }
        self.state
            .send_modify(|s| s.apply_community(id, &community));
        info!(community_id = %id, members = community.member_count, "joined community");
        Ok(community)
    }

    /// Leave as the current user.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAMember`] when the user is not in the known member
    /// list, [`StoreError::CreatorCannotLeave`] for the creator; otherwise the
    /// API failure. All are recorded.
    pub async fn leave_community(&self, id: &str) -> Result<Community, StoreError> {
        let precondition = {
            let state = self.state.borrow();
            match state.find(id) {
                Some(c) if !c.is_member(&self.user.id) => Some(StoreError::NotAMember),
                Some(c) if c.is_creator(&self.user.id) => Some(StoreError::CreatorCannotLeave),
                _ => None,
            }
        };
        if let Some(err) = precondition {
            return Err(self.record(err));
        }

        let community = self
            .api
            .leave_community(id)
            .await
            .map_err(|e| self.fail(e))?;

        self.state
            .send_modify(|s| s.apply_community(id, &community));
        info!(community_id = %id, members = community.member_count, "left community");
        Ok(community)
    }

    /// Post a chat message. It is appended to the held transcript when `id`
    /// is the pending target, else to the visible one when `id` is active.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyMessage`] before any network call when `content`
    /// is blank; otherwise the recorded API failure.
    pub async fn send_community_message(&self, id: &str, content: &str) -> Result<ChatMessage, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyMessage);
        }

        let message = self
            .api
            .send_message(id, content)
            .await
            .map_err(|e| self.fail(e))?;

        let appended = self.state.send_if_modified(|s| {
            if s.pending_id.as_deref() == Some(id) {
                if let Some(chat) = s.pending_chat.as_mut() {
                    chat.push(message.clone());
                    return false;
                }
            }
            let owns_chat = s.chat_for.as_deref().is_none_or(|owner| owner == id);
            if s.active_id() != Some(id) || !owns_chat {
                return false;
            }
            s.chat.push(message.clone());
            s.chat_for = Some(id.to_string());
            true
        });
        if !appended {
            debug!(community_id = %id, "message sent outside the visible transcript");
        }
        Ok(message)
    }
}
