//! Create-community form: draft accumulator with a single-shot submit.
//!
//! DESIGN
//! ======
//! The form always keeps at least one rule row so there is somewhere to type.
//! Blank rows are dropped by the store's normalization on submit. Tags keep
//! insertion order; a tag that matches an existing one ignoring case is not
//! added twice.
//!
//! ERROR HANDLING
//! ==============
//! Field-level problems (empty tag, unknown category, non-image file) come
//! back as `StoreError::ValidationFailed` straight to the caller. `submit`
//! consumes the form and hands it back on failure so nothing typed is lost.

#[cfg(test)]
#[path = "create_test.rs"]
mod create_test;

use tracing::debug;

use super::Navigation;
use crate::net::types::{Category, Community, CommunityDraft, ImagePreview, Rule};
use crate::state::community::CommunityStore;
use crate::state::error::StoreError;

/// Outcome of a successful submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub community: Community,
    pub navigation: Navigation,
}

/// A failed submit, carrying the untouched form for retry.
#[derive(Debug)]
pub struct SubmitFailure {
    pub form: CreateForm,
    pub error: StoreError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateForm {
    draft: CommunityDraft,
}

impl Default for CreateForm {
    fn default() -> Self {
        Self { draft: CommunityDraft { rules: vec![Rule::default()], ..CommunityDraft::default() } }
    }
}

impl CreateForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn draft(&self) -> &CommunityDraft {
        &self.draft
    }

    // =========================================================================
    // SCALAR FIELDS
    // =========================================================================

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_category(&mut self, category: Category) {
        self.draft.category = Some(category);
    }

    /// Set the category from its display label.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] when the label is not one of the 16
    /// categories; the previous choice is kept.
    pub fn set_category_str(&mut self, label: &str) -> Result<(), StoreError> {
        let category = label
            .parse::<Category>()
            .map_err(|e| StoreError::ValidationFailed(e.to_string()))?;
        self.set_category(category);
        Ok(())
    }

    pub fn set_private(&mut self, is_private: bool) {
        self.draft.is_private = is_private;
    }

    // =========================================================================
    // RULES
    // =========================================================================

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.draft.rules
    }

    pub fn add_rule(&mut self) {
        self.draft.rules.push(Rule::default());
    }

    /// Replace the rule row at `index`.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] when there is no such row.
    pub fn update_rule(&mut self, index: usize, rule: Rule) -> Result<(), StoreError> {
        let slot = self
            .draft
            .rules
            .get_mut(index)
            .ok_or_else(|| StoreError::ValidationFailed(format!("no rule at position {index}")))?;
        *slot = rule;
        Ok(())
    }

    #[must_use]
    pub fn can_remove_rule(&self) -> bool {
        self.draft.rules.len() > 1
    }

    /// Remove the rule row at `index`. Refused for the last remaining row or
    /// an out-of-range index.
    pub fn remove_rule(&mut self, index: usize) -> bool {
        if !self.can_remove_rule() || index >= self.draft.rules.len() {
            return false;
        }
        self.draft.rules.remove(index);
        true
    }

    // =========================================================================
    // TAGS
    // =========================================================================

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.draft.tags
    }

    /// Add a trimmed tag. Returns `Ok(false)` when it is already present.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] for an empty or whitespace-only tag.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, StoreError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(StoreError::ValidationFailed("tag is empty".into()));
        }
        if self.draft.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            debug!(%tag, "duplicate tag ignored");
            return Ok(false);
        }
        self.draft.tags.push(tag.to_string());
        Ok(true)
    }

    /// Remove a tag, matching the same way `add_tag` detects duplicates.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.draft.tags.len();
        self.draft.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.draft.tags.len() != before
    }

    // =========================================================================
    // IMAGES
    // =========================================================================

    /// Attach a local avatar preview.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] when the file is not an image.
    pub fn set_avatar(&mut self, preview: ImagePreview) -> Result<(), StoreError> {
        self.draft.avatar = Some(require_image(preview)?);
        Ok(())
    }

    pub fn clear_avatar(&mut self) {
        self.draft.avatar = None;
    }

    /// Attach a local cover image preview.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] when the file is not an image.
    pub fn set_cover_image(&mut self, preview: ImagePreview) -> Result<(), StoreError> {
        self.draft.cover_image = Some(require_image(preview)?);
        Ok(())
    }

    pub fn clear_cover_image(&mut self) {
        self.draft.cover_image = None;
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Create the community. Exactly one store call is made.
    ///
    /// # Errors
    ///
    /// Returns the form unchanged together with the store failure.
    pub async fn submit(self, store: &CommunityStore) -> Result<Created, SubmitFailure> {
        debug!(name = %self.draft.name, "submitting new community");
        match store.create_community(&self.draft).await {
            Ok(community) => Ok(Created { community, navigation: Navigation::CommunitiesList }),
            Err(error) => Err(SubmitFailure { form: self, error }),
        }
    }
}

fn require_image(preview: ImagePreview) -> Result<ImagePreview, StoreError> {
    if preview.is_image() {
        Ok(preview)
    } else {
        Err(StoreError::ValidationFailed(format!(
            "{} is not an image ({})",
            preview.file_name, preview.content_type
        )))
    }
}
