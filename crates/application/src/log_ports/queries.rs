use flowtrail_domain::{BusinessModule, OperationType};
use serde::{Deserialize, Serialize};

/// Dimensions a log query can narrow by. Absent dimensions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Entity kind.
    pub business_module: Option<BusinessModule>,
    /// Entity id within the module.
    pub business_id: Option<String>,
    /// Owning case.
    pub onboarding_id: Option<String>,
    /// Owning stage.
    pub stage_id: Option<String>,
    /// Operation kind.
    pub operation_type: Option<OperationType>,
}

/// A paged log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPageQuery {
    /// Filter dimensions.
    pub filter: LogFilter,
    /// One-based page index.
    pub page_index: u32,
    /// Page size requested by the caller.
    pub page_size: u32,
}

impl LogPageQuery {
    /// Creates a query for the first page with the default size.
    #[must_use]
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            page_index: 1,
            page_size: 20,
        }
    }

    /// Returns the page index clamped to a sane one-based value.
    #[must_use]
    pub fn effective_page_index(&self) -> u32 {
        self.page_index.max(1)
    }

    /// Returns the page size clamped to 1..=100.
    #[must_use]
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, 100)
    }
}

impl Default for LogPageQuery {
    fn default() -> Self {
        Self::new(LogFilter::default())
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total_count: u64,
    /// One-based page index served.
    pub page_index: u32,
    /// Page size served.
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    /// Creates an empty page mirroring the query's paging values.
    #[must_use]
    pub fn empty(query: &LogPageQuery) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_index: query.effective_page_index(),
            page_size: query.effective_page_size(),
        }
    }
}
