//! List requests, pages and continuation tokens.
//!
//! # Invariants
//! - Listings are ordered by ascending canonical name.
//! - A page token is a keyset cursor: the name of the last returned item.
//!   Continuing from it never repeats or skips an entity that existed for
//!   the whole listing.
//! - An empty `next_page_token` means the listing is exhausted.

use crate::model::Resource;
use crate::store::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Upper bound applied to caller-provided page sizes.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Caller-side listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Opaque filter expression. See `Filter::parse`.
    #[serde(default)]
    pub filter: String,
    /// Token from a previous page; empty starts from the beginning.
    #[serde(default)]
    pub page_token: String,
    /// `None` or `0` lists everything remaining.
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListRequest {
    /// Unbounded listing with no filter.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// First page of at most `page_size` items.
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Request for the page following `previous`.
    pub fn next_page<T>(&self, previous: &Page<T>) -> Self {
        Self {
            page_token: previous.next_page_token.clone(),
            ..self.clone()
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: String,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PageCursor {
    after: String,
}

/// Decoded, normalized form of a `ListRequest`'s pagination controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageWindow {
    after: Option<String>,
    limit: Option<usize>,
}

impl PageWindow {
    pub(crate) fn from_request(request: &ListRequest, max_page_size: u32) -> StoreResult<Self> {
        Ok(Self {
            after: decode_page_token(&request.page_token)?,
            limit: normalize_page_size(request.page_size, max_page_size),
        })
    }

    /// Lower exclusive bound on names for this page.
    pub(crate) fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    /// Lower bound usable directly in SQL (`name > ?`).
    pub(crate) fn after_or_empty(&self) -> &str {
        self.after.as_deref().unwrap_or("")
    }

    /// Whether `collected` items already exceed the page, meaning one more
    /// item than the page holds has been seen.
    pub(crate) fn is_overfull(&self, collected: usize) -> bool {
        self.limit.is_some_and(|limit| collected > limit)
    }

    /// Builds the page from name-ordered candidates, reading at most one
    /// item past the page size to decide whether a continuation exists.
    pub(crate) fn collect<T, I>(&self, candidates: I) -> StoreResult<Page<T>>
    where
        T: Resource,
        I: IntoIterator<Item = T>,
    {
        let mut items = Vec::new();
        for item in candidates {
            items.push(item);
            if self.is_overfull(items.len()) {
                break;
            }
        }
        self.finish(items)
    }

    /// Truncates an over-full item list and derives the continuation token.
    pub(crate) fn finish<T: Resource>(&self, mut items: Vec<T>) -> StoreResult<Page<T>> {
        let next_page_token = match self.limit {
            Some(limit) if items.len() > limit => {
                items.truncate(limit);
                match items.last() {
                    Some(last) => encode_page_token(last.name())?,
                    None => String::new(),
                }
            }
            _ => String::new(),
        };
        Ok(Page {
            items,
            next_page_token,
        })
    }
}

/// Normalizes a page size: `None`/`0` is unbounded, others clamp to `max`.
pub fn normalize_page_size(page_size: Option<u32>, max_page_size: u32) -> Option<usize> {
    match page_size {
        None | Some(0) => None,
        Some(value) => Some(value.min(max_page_size.max(1)) as usize),
    }
}

fn encode_page_token(after: &str) -> StoreResult<String> {
    let cursor = PageCursor {
        after: after.to_string(),
    };
    serde_json::to_string(&cursor)
        .map_err(|err| StoreError::InvalidData(format!("failed to serialize page cursor: {err}")))
}

fn decode_page_token(token: &str) -> StoreResult<Option<String>> {
    if token.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<PageCursor>(token)
        .map(|cursor| Some(cursor.after))
        .map_err(|_| StoreError::InvalidPageToken(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::Project;

    fn projects(ids: &[&str]) -> Vec<Project> {
        ids.iter().map(|id| Project::new(id)).collect()
    }

    #[test]
    fn page_size_zero_and_none_are_unbounded() {
        assert_eq!(normalize_page_size(None, 50), None);
        assert_eq!(normalize_page_size(Some(0), 50), None);
        assert_eq!(normalize_page_size(Some(7), 50), Some(7));
        assert_eq!(normalize_page_size(Some(500), 50), Some(50));
    }

    #[test]
    fn collect_emits_token_only_when_more_items_exist() {
        let window = PageWindow::from_request(&ListRequest::first_page(2), 100).unwrap();

        let page = window.collect(projects(&["a", "b", "c"])).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.is_last());

        let exact = window.collect(projects(&["a", "b"])).unwrap();
        assert_eq!(exact.items.len(), 2);
        assert!(exact.is_last());
    }

    #[test]
    fn token_carries_last_returned_name() {
        let window = PageWindow::from_request(&ListRequest::first_page(1), 100).unwrap();
        let page = window.collect(projects(&["a", "b"])).unwrap();

        let request = ListRequest::first_page(1).next_page(&page);
        let next = PageWindow::from_request(&request, 100).unwrap();
        assert_eq!(next.after(), Some("projects/a"));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let request = ListRequest {
            page_token: "not-a-token".to_string(),
            ..ListRequest::default()
        };
        let err = PageWindow::from_request(&request, 100).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPageToken(_)));
    }
}
