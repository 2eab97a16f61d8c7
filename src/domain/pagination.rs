use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;

/// `?page=&limit=` query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    /// # Example
    /// ```
    /// use agrotrade_api::domain::pagination::{PageQuery, Pagination};
    ///
    /// let window = Pagination::from_query(PageQuery { page: Some(3), limit: None }).unwrap();
    /// assert_eq!(window.offset(), 50);
    /// ```
    pub fn from_query(query: PageQuery) -> Result<Self, String> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Slices an in-memory, already ordered collection
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the total row count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub window: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, window: Pagination) -> Self {
        Self {
            items,
            total,
            window,
        }
    }

    pub fn total_page(&self) -> i64 {
        (self.total + self.window.limit - 1) / self.window.limit
    }

    pub fn has_next_page(&self) -> bool {
        self.window.page < self.total_page()
    }

    pub fn has_prev_page(&self) -> bool {
        self.window.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            window: self.window,
        }
    }
}

impl<T: Serialize> Page<T> {
    /// Renders `{<key>: [...], totalPage, page, limit, hasNextPage, hasPrevPage}`
    pub fn into_json(self, key: &str) -> Value {
        let mut body = json!({
            "totalPage": self.total_page(),
            "page": self.window.page,
            "limit": self.window.limit,
            "hasNextPage": self.has_next_page(),
            "hasPrevPage": self.has_prev_page(),
        });
        body[key] = json!(self.items);
        body
    }
}
