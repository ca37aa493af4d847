//! Query Builder pagination operations

use serde::Serialize;

use super::builder::QueryBuilder;

/// Page request and, once a select has run, the totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub records_count: Option<u64>,
    pub pages_count: Option<u64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            records_count: None,
            pages_count: None,
        }
    }

    /// Rows skipped before this page; saturates instead of overflowing
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Fill in totals; there is always at least one page
    pub fn with_records_count(mut self, records_count: u64) -> Self {
        let per_page = self.per_page.max(1) as u64;
        self.records_count = Some(records_count);
        self.pages_count = Some(records_count.div_ceil(per_page).max(1));
        self
    }
}

impl QueryBuilder {
    /// Add LIMIT clause; negative counts clamp to 0
    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count.max(0));
        self
    }

    /// Add OFFSET clause; negative counts clamp to 0
    pub fn offset(mut self, count: i64) -> Self {
        self.offset_value = Some(count.max(0));
        self
    }

    /// Page-based LIMIT + OFFSET. `page` and `per_page` below 1 become 1.
    pub fn paginate(self, page: i64, per_page: i64) -> Self {
        let pagination = Pagination::new(page, per_page);
        let mut query = self
            .limit(pagination.per_page)
            .offset(pagination.offset());
        query.pagination = Some(pagination);
        query
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }
}
