//! In-memory gateway and fixtures shared by store and view tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Notify;

use crate::net::api::{ApiError, CommunityApi};
use crate::net::types::{
    Category, ChatMessage, Community, CommunityDraft, CommunityPage, CurrentUser, Member, Pagination, Post, Role, Rule,
};

use super::community::CommunityStore;

pub const USER: &str = "me";
pub const CREATED_AT: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

// =============================================================================
// FIXTURES
// =============================================================================

/// Community created by `creator`, with `extra` plain members.
#[must_use]
pub fn community(id: &str, name: &str, creator: &str, extra: &[&str]) -> Community {
    let mut members = vec![Member { user: creator.to_string(), role: Role::Admin }];
    members.extend(extra.iter().map(|u| Member { user: (*u).to_string(), role: Role::Member }));
    Community {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("about {name}"),
        category: Category::Pets,
        is_private: false,
        member_count: u32::try_from(members.len()).unwrap_or(u32::MAX),
        members,
        rules: vec![Rule { title: "Be kind".into(), description: "No insults".into() }],
        tags: vec!["friendly".into()],
        avatar: None,
        cover_image: None,
        created_by: creator.to_string(),
    }
}

#[must_use]
pub fn post(id: &str, community: &str) -> Post {
    Post {
        id: id.to_string(),
        community: community.to_string(),
        author: "someone".into(),
        content: format!("post {id}"),
        created_at: CREATED_AT,
    }
}

#[must_use]
pub fn message(id: &str, community: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        community: community.to_string(),
        sender: "someone".into(),
        content: content.to_string(),
        created_at: CREATED_AT,
    }
}

#[must_use]
pub fn valid_draft(name: &str) -> CommunityDraft {
    CommunityDraft {
        name: name.to_string(),
        description: "a place for pets".into(),
        category: Some(Category::PetAdoption),
        ..CommunityDraft::default()
    }
}

// =============================================================================
// MOCK API
// =============================================================================

#[derive(Default)]
struct MockInner {
    communities: Vec<Community>,
    posts: HashMap<String, Vec<Post>>,
    chat: HashMap<String, Vec<ChatMessage>>,
    calls: Vec<String>,
    fail_next: Option<ApiError>,
    gates: HashMap<String, Arc<Notify>>,
    next_id: u32,
}

/// Server stand-in that acts for `USER`.
///
/// Calls are labelled `op:id` (for example `posts:c1`). A gate registered for
/// a label holds that call until the test releases it, which lets tests force
/// out-of-order completion.
#[derive(Default)]
pub struct MockApi {
    inner: Mutex<MockInner>,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_communities(communities: Vec<Community>) -> Self {
        let api = Self::new();
        api.lock().communities = communities;
        api
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_posts(&self, id: &str, posts: Vec<Post>) {
        self.lock().posts.insert(id.to_string(), posts);
    }

    pub fn set_chat(&self, id: &str, chat: Vec<ChatMessage>) {
        self.lock().chat.insert(id.to_string(), chat);
    }

    /// Replace the server-side copy of a community.
    pub fn put_community(&self, community: Community) {
        let mut inner = self.lock();
        inner.communities.retain(|c| c.id != community.id);
        inner.communities.push(community);
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.lock().fail_next = Some(err);
    }

    /// Hold calls labelled `label` until the returned handle is notified.
    #[must_use]
    pub fn gate(&self, label: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock()
            .gates
            .insert(label.to_string(), Arc::clone(&notify));
        notify
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    async fn enter(&self, label: String) -> Result<(), ApiError> {
        let gate = {
            let mut inner = self.lock();
            inner.calls.push(label.clone());
            inner.gates.remove(&label)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.lock().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn find(&self, id: &str) -> Result<Community, ApiError> {
        self.lock()
            .communities
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("community {id}")))
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Community)) -> Result<Community, ApiError> {
        let mut inner = self.lock();
        let community = inner
            .communities
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("community {id}")))?;
        f(community);
        community.member_count = u32::try_from(community.members.len()).unwrap_or(u32::MAX);
        Ok(community.clone())
    }
}

#[async_trait::async_trait]
impl CommunityApi for MockApi {
    async fn list_communities(&self, page: u32) -> Result<CommunityPage, ApiError> {
        self.enter(format!("list:{page}")).await?;
        Ok(CommunityPage { communities: self.lock().communities.clone(), pagination: Pagination { page, page_count: 1 } })
    }

    async fn get_community(&self, id: &str) -> Result<Community, ApiError> {
        self.enter(format!("get:{id}")).await?;
        self.find(id)
    }

    async fn create_community(&self, draft: &CommunityDraft) -> Result<Community, ApiError> {
        self.enter("create:".to_string()).await?;
        let mut inner = self.lock();
        inner.next_id += 1;
        let created = Community {
            id: format!("new-{}", inner.next_id),
            name: draft.name.clone(),
            description: draft.description.clone(),
            category: draft.category.unwrap_or(Category::Other),
            is_private: draft.is_private,
            member_count: 1,
            members: vec![Member { user: USER.into(), role: Role::Admin }],
            rules: draft.rules.clone(),
            tags: draft.tags.clone(),
            avatar: draft.avatar.as_ref().map(|a| format!("/uploads/{}", a.file_name)),
            cover_image: draft.cover_image.as_ref().map(|c| format!("/uploads/{}", c.file_name)),
            created_by: USER.into(),
        };
        inner.communities.push(created.clone());
        Ok(created)
    }

    async fn update_community(&self, id: &str, draft: &CommunityDraft) -> Result<Community, ApiError> {
        self.enter(format!("update:{id}")).await?;
        let draft = draft.clone();
        self.modify(id, move |c| {
            c.name = draft.name;
            c.description = draft.description;
            c.category = draft.category.unwrap_or(c.category);
            c.is_private = draft.is_private;
            c.rules = draft.rules;
            c.tags = draft.tags;
        })
    }

    async fn delete_community(&self, id: &str) -> Result<(), ApiError> {
        self.enter(format!("delete:{id}")).await?;
        self.find(id)?;
        self.lock().communities.retain(|c| c.id != id);
        Ok(())
    }

    async fn join_community(&self, id: &str) -> Result<Community, ApiError> {
        self.enter(format!("join:{id}")).await?;
        self.modify(id, |c| {
            if !c.is_member(USER) {
                c.members.push(Member { user: USER.into(), role: Role::Member });
            }
        })
    }

    async fn leave_community(&self, id: &str) -> Result<Community, ApiError> {
        self.enter(format!("leave:{id}")).await?;
        self.modify(id, |c| c.members.retain(|m| m.user != USER))
    }

    async fn community_posts(&self, id: &str) -> Result<Vec<Post>, ApiError> {
        self.enter(format!("posts:{id}")).await?;
        Ok(self.lock().posts.get(id).cloned().unwrap_or_default())
    }

    async fn community_chat(&self, id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        self.enter(format!("chat:{id}")).await?;
        Ok(self.lock().chat.get(id).cloned().unwrap_or_default())
    }

    async fn send_message(&self, id: &str, content: &str) -> Result<ChatMessage, ApiError> {
        self.enter(format!("send:{id}")).await?;
        let mut inner = self.lock();
        inner.next_id += 1;
        let msg = ChatMessage {
            id: format!("m-{}", inner.next_id),
            community: id.to_string(),
            sender: USER.into(),
            content: content.to_string(),
            created_at: CREATED_AT,
        };
        inner.chat.entry(id.to_string()).or_default().push(msg.clone());
        Ok(msg)
    }
}

// =============================================================================
// STORE BUILDERS
// =============================================================================

/// Store acting as `USER` over the given mock.
#[must_use]
pub fn store_with(api: &Arc<MockApi>) -> CommunityStore {
    CommunityStore::new(Arc::clone(api) as Arc<dyn CommunityApi>, CurrentUser::new(USER))
}

/// Mock seeded with `communities` plus a store over it that has loaded the list.
pub async fn loaded_store(communities: Vec<Community>) -> (Arc<MockApi>, CommunityStore) {
    let api = Arc::new(MockApi::with_communities(communities));
    let store = store_with(&api);
    if let Err(err) = store.list_communities().await {
        tracing::error!(%err, "seed list failed");
    }
    (api, store)
}
