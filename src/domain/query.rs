use crate::errors::{HubError, HubResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// A listing request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub sources: Vec<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl NewsQuery {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            page: None,
            limit: None,
        }
    }

    pub fn with_page(mut self, page: Option<i64>) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Applies paging defaults. An empty source filter is the only hard error.
    pub fn normalize(self) -> HubResult<ListingQuery> {
        if self.sources.is_empty() {
            return Err(HubError::InvalidRequest(
                "at least one source is required".to_string(),
            ));
        }

        let page = match self.page {
            Some(p) if p > 0 && p <= u32::MAX as i64 => p as u32,
            _ => DEFAULT_PAGE,
        };

        let limit = match self.limit {
            Some(l) if l > 0 && l <= MAX_LIMIT as i64 => l as u32,
            _ => DEFAULT_LIMIT,
        };

        Ok(ListingQuery {
            sources: self.sources,
            page,
            limit,
        })
    }
}

/// A validated listing request. Field values are exactly what the cache key
/// and the storage query see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub sources: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListingQuery {
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}
