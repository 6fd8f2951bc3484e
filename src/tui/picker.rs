//! Paged issue suggestion list fed by asynchronous searches.
//!
//! Every query change stamps a [`SearchRequest`]. Results come back tagged
//! with that stamp and are dropped when the user has typed something else in
//! the meantime, so a slow response never overwrites a newer one.

#![allow(missing_docs)]

use super::keys::KeyEvent;
use crate::api::IssueSummary;
use crate::tracking::session::SessionId;

/// Which row a search was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    Session(SessionId),
    NewTimer,
}

/// A search the runtime should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub target: SearchTarget,
    /// Trimmed query text.
    pub query: String,
}

/// Result of feeding one key to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    Ignored,
    /// The highlight moved to this index.
    Highlighted(usize),
    /// Enter on the highlighted suggestion; `None` when the list is empty.
    Chosen(Option<IssueSummary>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePicker {
    target: SearchTarget,
    query: String,
    items: Vec<IssueSummary>,
    highlight: usize,
    page: usize,
    page_size: usize,
    loading: bool,
}

impl IssuePicker {
    #[must_use]
    pub fn new(target: SearchTarget, page_size: usize) -> Self {
        Self {
            target,
            query: String::new(),
            items: Vec::new(),
            highlight: 0,
            page: 0,
            page_size: page_size.max(1),
            loading: false,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &SearchTarget {
        &self.target
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn items(&self) -> &[IssueSummary] {
        &self.items
    }

    #[must_use]
    pub const fn highlight(&self) -> usize {
        self.highlight
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&IssueSummary> {
        self.items.get(self.highlight)
    }

    /// Update the query from the field text.
    ///
    /// Returns a request only when the trimmed text actually changed.
    pub fn set_query(&mut self, text: &str) -> Option<SearchRequest> {
        let trimmed = text.trim();
        if trimmed == self.query {
            return None;
        }
        self.query = trimmed.to_string();
        Some(self.request())
    }

    /// Request suggestions for the current query, e.g. to preload an empty one.
    pub fn request(&mut self) -> SearchRequest {
        self.loading = true;
        SearchRequest {
            target: self.target.clone(),
            query: self.query.clone(),
        }
    }

    /// Apply results for `request`. Returns `false` if they are stale.
    pub fn apply_results(&mut self, request: &SearchRequest, items: Vec<IssueSummary>) -> bool {
        if !self.accepts(request) {
            return false;
        }
        self.items = items;
        self.loading = false;
        self.highlight = 0;
        self.page = 0;
        true
    }

    /// Mark a failed search as finished, keeping the previous items.
    pub fn search_failed(&mut self, request: &SearchRequest) -> bool {
        if !self.accepts(request) {
            return false;
        }
        self.loading = false;
        true
    }

    fn accepts(&self, request: &SearchRequest) -> bool {
        request.target == self.target && request.query == self.query
    }

    pub fn handle(&mut self, key: &KeyEvent) -> PickerEvent {
        let next = if key.up_arrow {
            self.highlight.saturating_sub(1)
        } else if key.down_arrow {
            self.highlight + 1
        } else if key.enter {
            return PickerEvent::Chosen(self.highlighted().cloned());
        } else {
            return PickerEvent::Ignored;
        };

        self.highlight = next.min(self.items.len().saturating_sub(1));
        if self.highlight >= self.page + self.page_size {
            self.page += 1;
        } else if self.highlight < self.page {
            self.page -= 1;
        }
        self.page = self.page.min(self.items.len().saturating_sub(1));
        PickerEvent::Highlighted(self.highlight)
    }

    /// Items on the current page with their absolute indices.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &IssueSummary)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.page)
            .take(self.page_size)
    }
}
