use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 100;

/// 1-based page/limit query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageParams {
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(params: &PageParams, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
            has_next: params.page < total_pages,
            has_prev: params.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        Self {
            items,
            pagination: PageMeta::new(params, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        let p = PageParams { page: 1, limit: 10 };
        assert_eq!(p.offset(), 0);
        let p = PageParams { page: 3, limit: 10 };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let p = PageParams { page: 0, limit: 0 }.normalized();
        assert_eq!((p.page, p.limit), (1, 1));
        let p = PageParams {
            page: -5,
            limit: 10_000,
        }
        .normalized();
        assert_eq!((p.page, p.limit), (1, MAX_LIMIT));
    }

    #[test]
    fn meta_rounds_total_pages_up() {
        let params = PageParams { page: 2, limit: 10 };
        let meta = PageMeta::new(&params, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn meta_for_empty_result() {
        let params = PageParams { page: 1, limit: 10 };
        let meta = PageMeta::new(&params, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn last_page_has_no_next() {
        let params = PageParams { page: 3, limit: 10 };
        let meta = PageMeta::new(&params, 25);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }
}
