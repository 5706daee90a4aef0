//! Page/limit pagination shared by every listing endpoint.
//!
//! The outbound shape `{ data, meta: { page, limit, total, totalPages } }` is
//! consumed verbatim by the dashboard, so [`Page`] serializes in camelCase.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// A validated (page, limit) pair. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Apply defaults (`page = 1`, `limit = 10`) and reject zero values.
    ///
    /// No upper bound is enforced; callers that want one use [`PageRequest::capped`].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> DomainResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 {
            return Err(DomainError::validation("page", "min:1"));
        }
        if limit == 0 {
            return Err(DomainError::validation("limit", "min:1"));
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Clamp `limit` to `max_limit` (which must itself be at least 1).
    pub fn capped(self, max_limit: u32) -> Self {
        Self {
            page: self.page,
            limit: self.limit.min(max_limit.max(1)),
        }
    }

    pub fn window(&self, total: u64) -> PageWindow {
        PageWindow {
            skip: self.offset(),
            take: u64::from(self.limit),
            total_pages: total_pages(total, self.limit),
        }
    }
}

/// Offset window plus the page count for a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub skip: u64,
    pub take: u64,
    pub total_pages: u64,
}

/// Convert `(page, limit, total)` into a skip/take window.
pub fn paginate(page: Option<u32>, limit: Option<u32>, total: u64) -> DomainResult<PageWindow> {
    Ok(PageRequest::new(page, limit)?.window(total))
}

/// `ceil(total / limit)`; zero when there is nothing to page through.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if total == 0 || limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page: request.page(),
                limit: request.limit(),
                total,
                total_pages: total_pages(total, request.limit()),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
