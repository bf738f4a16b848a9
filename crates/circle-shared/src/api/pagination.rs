use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters. Pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_absent() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn limit_is_clamped_to_max() {
        let params = PageParams {
            page: Some(2),
            limit: Some(10_000),
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), MAX_PAGE_SIZE);
    }

    #[test]
    fn zero_values_are_normalized() {
        let params = PageParams {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn offset_advances_with_page() {
        let params = PageParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(), 40);
    }
}
