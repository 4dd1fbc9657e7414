//! Community data model shared by the gateway, the store, and the views.
//!
//! Wire format is camelCase JSON. Identifiers are opaque strings; `id` also
//! accepts the `_id` spelling some API deployments emit.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// IDENTITY
// =============================================================================

/// Read-only identity supplied by the external authentication collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// Closed set of community categories shared by the create and edit flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pets,
    Dogs,
    Cats,
    Birds,
    Fish,
    Reptiles,
    #[serde(rename = "Small Animals")]
    SmallAnimals,
    Wildlife,
    #[serde(rename = "Pet Care")]
    PetCare,
    #[serde(rename = "Pet Training")]
    PetTraining,
    #[serde(rename = "Pet Health")]
    PetHealth,
    #[serde(rename = "Pet Adoption")]
    PetAdoption,
    #[serde(rename = "Pet Rescue")]
    PetRescue,
    #[serde(rename = "Pet Events")]
    PetEvents,
    #[serde(rename = "Pet Products")]
    PetProducts,
    Other,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Pets,
        Category::Dogs,
        Category::Cats,
        Category::Birds,
        Category::Fish,
        Category::Reptiles,
        Category::SmallAnimals,
        Category::Wildlife,
        Category::PetCare,
        Category::PetTraining,
        Category::PetHealth,
        Category::PetAdoption,
        Category::PetRescue,
        Category::PetEvents,
        Category::PetProducts,
        Category::Other,
    ];

    /// Display label, identical to the wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pets => "Pets",
            Self::Dogs => "Dogs",
            Self::Cats => "Cats",
            Self::Birds => "Birds",
            Self::Fish => "Fish",
            Self::Reptiles => "Reptiles",
            Self::SmallAnimals => "Small Animals",
            Self::Wildlife => "Wildlife",
            Self::PetCare => "Pet Care",
            Self::PetTraining => "Pet Training",
            Self::PetHealth => "Pet Health",
            Self::PetAdoption => "Pet Adoption",
            Self::PetRescue => "Pet Rescue",
            Self::PetEvents => "Pet Events",
            Self::PetProducts => "Pet Products",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a category string is outside the closed set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

// =============================================================================
// COMMUNITY
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Rule {
    fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Unique, in display order.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub created_by: String,
}

impl Community {
    #[must_use]
    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user == user_id)
    }

    #[must_use]
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member(user_id).is_some()
    }

    #[must_use]
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    /// The creator must always be listed as an admin member.
    #[must_use]
    pub fn creator_is_admin(&self) -> bool {
        self.member(&self.created_by)
            .is_some_and(|m| m.role == Role::Admin)
    }
}

// =============================================================================
// POSTS & CHAT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: String,
    pub community: String,
    pub author: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(alias = "_id")]
    pub id: String,
    pub community: String,
    pub sender: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// PAGINATION
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_count: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_count: 1 }
    }
}

/// One page of the community collection as returned by the list endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunityPage {
    pub communities: Vec<Community>,
    pub pagination: Pagination,
}

// =============================================================================
// DRAFTS
// =============================================================================

/// A locally selected image that has not been uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePreview {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("image/")
    }
}

impl fmt::Debug for ImagePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePreview")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Editable community fields submitted by the create and edit flows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDraft {
    pub name: String,
    pub description: String,
    pub category: Option<Category>,
    pub is_private: bool,
    pub rules: Vec<Rule>,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub avatar: Option<ImagePreview>,
    #[serde(skip)]
    pub cover_image: Option<ImagePreview>,
}

impl CommunityDraft {
    /// Check the required fields. The error names the first missing one.
    ///
    /// # Errors
    ///
    /// Returns a message when name, description, or category is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".into());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".into());
        }
        if self.category.is_none() {
            return Err("category is required".into());
        }
        Ok(())
    }

    /// Trimmed copy with blank rule rows and blank or repeated tags removed.
    /// Tags compare case-insensitively; the first spelling wins.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let rules = self
            .rules
            .iter()
            .filter(|r| !r.is_blank())
            .map(|r| Rule { title: r.title.trim().to_string(), description: r.description.trim().to_string() })
            .collect();

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }

        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            is_private: self.is_private,
            rules,
            tags,
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
        }
    }

    #[must_use]
    pub fn has_images(&self) -> bool {
        self.avatar.is_some() || self.cover_image.is_some()
    }
}
