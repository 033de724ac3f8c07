//! Offset pagination over sorted result sets.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Build a page request, clamping out-of-range values.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Zero-based page index as used by sea-orm paginators.
    pub fn index(self) -> u64 {
        self.page - 1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total_items: u64) -> Self {
        Self {
            items,
            current_page: page.page,
            total_pages: total_items.div_ceil(page.limit),
            total_items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_values() {
        assert_eq!(Page::new(None, None), Page::default());
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(3), Some(1000)).limit, MAX_LIMIT);
        assert_eq!(Page::new(Some(3), None).index(), 2);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(Some(1), Some(20));
        assert_eq!(Paginated::<u8>::new(Vec::new(), page, 0).total_pages, 0);
        assert_eq!(Paginated::<u8>::new(Vec::new(), page, 20).total_pages, 1);
        assert_eq!(Paginated::<u8>::new(Vec::new(), page, 21).total_pages, 2);
    }
}
