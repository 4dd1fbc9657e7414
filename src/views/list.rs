//! Community list: text filter and page window over the store's list.
//!
//! DESIGN
//! ======
//! Filtering is a pure function of `(list, query)`. [`ListView`] memoizes the
//! last result keyed on the list's `Arc` pointer and the query string, so a
//! re-render with unchanged inputs costs a pointer compare.

#[cfg(test)]
#[path = "list_test.rs"]
mod list_test;

use std::sync::Arc;

use crate::net::types::{Community, Pagination};

/// Case-insensitive substring match on name, description, or category.
/// `needle` must already be lowercase.
fn matches(community: &Community, needle: &str) -> bool {
    community.name.to_lowercase().contains(needle)
        || community.description.to_lowercase().contains(needle)
        || community.category.as_str().to_lowercase().contains(needle)
}

/// Communities whose name, description, or category contains `query`.
///
/// A blank query returns the same `Arc` it was given.
#[must_use]
pub fn filter_communities(list: &Arc<Vec<Community>>, query: &str) -> Arc<Vec<Community>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Arc::clone(list);
    }
    Arc::new(
        list.iter()
            .filter(|c| matches(c, &needle))
            .cloned()
            .collect(),
    )
}

#[derive(Debug)]
struct Memo {
    source: Arc<Vec<Community>>,
    query: String,
    filtered: Arc<Vec<Community>>,
}

/// Search box and page window for the communities screen.
#[derive(Debug)]
pub struct ListView {
    query: String,
    page: usize,
    page_size: usize,
    memo: Option<Memo>,
}

impl ListView {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self { query: String::new(), page: 1, page_size: page_size.max(1), memo: None }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Update the search text. A changed query starts again from page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
    }

    /// Filtered list, recomputed only when the list or query changed.
    pub fn filtered(&mut self, list: &Arc<Vec<Community>>) -> Arc<Vec<Community>> {
        Arc::clone(self.refresh(list))
    }

    fn refresh(&mut self, list: &Arc<Vec<Community>>) -> &Arc<Vec<Community>> {
        let memo = match self.memo.take() {
            Some(memo) if Arc::ptr_eq(&memo.source, list) && memo.query == self.query => memo,
            _ => Memo {
                source: Arc::clone(list),
                query: self.query.clone(),
                filtered: filter_communities(list, &self.query),
            },
        };
        &self.memo.insert(memo).filtered
    }

    fn page_count_for(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    /// Current page window of the filtered list. Clamps the page when the
    /// list has shrunk underneath it.
    pub fn visible(&mut self, list: &Arc<Vec<Community>>) -> Vec<Community> {
        let filtered = Arc::clone(self.refresh(list));
        let page_count = self.page_count_for(filtered.len());
        self.page = self.page.clamp(1, page_count);
        filtered
            .iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect()
    }

    pub fn pagination(&mut self, list: &Arc<Vec<Community>>) -> Pagination {
        let len = self.refresh(list).len();
        let page_count = self.page_count_for(len);
        self.page = self.page.clamp(1, page_count);
        Pagination {
            page: u32::try_from(self.page).unwrap_or(u32::MAX),
            page_count: u32::try_from(page_count).unwrap_or(u32::MAX),
        }
    }

    /// Jump to `page` (1-based), clamped to the available pages.
    pub fn set_page(&mut self, page: usize, list: &Arc<Vec<Community>>) {
        let len = self.refresh(list).len();
        self.page = page.clamp(1, self.page_count_for(len));
    }

    pub fn next_page(&mut self, list: &Arc<Vec<Community>>) {
        self.set_page(self.page.saturating_add(1), list);
    }

    pub fn prev_page(&mut self, list: &Arc<Vec<Community>>) {
        self.set_page(self.page.saturating_sub(1), list);
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PAGE_SIZE)
    }
}
