use serde::{Deserialize, Serialize};

use super::error::FilterError;
use crate::config::ApiConfig;

/// Raw paging query parameters, shared by every list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Resolve paging against configured bounds. Oversized limits are capped,
    /// zero values are rejected.
    pub fn resolve(params: &PageParams, api: &ApiConfig) -> Result<Self, FilterError> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(FilterError::InvalidPage("page starts at 1".to_string()));
        }

        let limit = match params.limit {
            None => api.default_page_size,
            Some(0) => return Err(FilterError::InvalidLimit("limit must be positive".to_string())),
            Some(l) if l > api.max_page_size => {
                tracing::debug!("Limit {} exceeds max {}, capping to max", l, api.max_page_size);
                api.max_page_size
            }
            Some(l) => l,
        };

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

/// Trash visibility for list endpoints: live rows by default, `?trashed=true`
/// for the trash view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrashFilter {
    #[default]
    Live,
    Trashed,
}

impl TrashFilter {
    pub fn from_flag(trashed: Option<bool>) -> Self {
        if trashed.unwrap_or(false) {
            TrashFilter::Trashed
        } else {
            TrashFilter::Live
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            TrashFilter::Live => "trashed_at IS NULL",
            TrashFilter::Trashed => "trashed_at IS NOT NULL",
        }
    }
}

/// Paged list envelope returned as `data` of list responses
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let limit = pagination.limit.max(1) as i64;
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn api() -> ApiConfig {
        let mut api = AppConfig::development().api;
        api.default_page_size = 25;
        api.max_page_size = 100;
        api
    }

    #[test]
    fn defaults_to_first_page() {
        let p = Pagination::resolve(&PageParams::default(), &api()).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 25 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn caps_limit_and_computes_offset() {
        let params = PageParams { page: Some(3), limit: Some(500), order: None };
        let p = Pagination::resolve(&params, &api()).unwrap();
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn rejects_zero_page_and_limit() {
        let zero_page = PageParams { page: Some(0), ..Default::default() };
        assert!(matches!(Pagination::resolve(&zero_page, &api()), Err(FilterError::InvalidPage(_))));

        let zero_limit = PageParams { limit: Some(0), ..Default::default() };
        assert!(matches!(Pagination::resolve(&zero_limit, &api()), Err(FilterError::InvalidLimit(_))));
    }

    #[test]
    fn page_counts_round_up() {
        let p = Pagination { page: 1, limit: 10 };
        assert_eq!(Page::new(vec![1, 2, 3], 21, p).pages, 3);
        assert_eq!(Page::new(Vec::<i32>::new(), 0, p).pages, 0);
        assert_eq!(Page::new(vec![1], 10, p).pages, 1);
    }

    #[test]
    fn trash_filter_from_flag() {
        assert_eq!(TrashFilter::from_flag(None), TrashFilter::Live);
        assert_eq!(TrashFilter::from_flag(Some(true)).to_sql(), "trashed_at IS NOT NULL");
    }
}
