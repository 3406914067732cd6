//! Offset-paginated list state shared by every list-owning store
//!
//! The one rule that matters: a page fetched at `offset == 0` replaces the
//! list, a page at any other offset is appended to it. Errors never clear
//! what is already loaded.

use crate::types::Pagination;

/// Items, pagination and per-list loading/error flags
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            loading: false,
            error: None,
        }
    }
}

/// Parameters for the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl<T> PagedList<T> {
    pub fn has_more(&self) -> bool {
        self.pagination.is_some_and(|p| p.has_more)
    }

    /// Mark a fetch as started
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Claim the next page for a "load more".
    ///
    /// Returns `None` (and changes nothing) when nothing more exists or a
    /// fetch is already in flight; otherwise marks the list loading.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        if self.loading {
            return None;
        }
        let pagination = self.pagination.filter(|p| p.has_more)?;
        self.begin();
        Some(PageRequest {
            limit: pagination.limit,
            offset: pagination.next_offset(),
        })
    }

    /// Merge a fetched page: replace at offset 0, append otherwise
    pub fn apply_page(&mut self, offset: u32, page: Vec<T>, pagination: Option<Pagination>) {
        if offset == 0 {
            self.items = page;
        } else {
            self.items.extend(page);
        }
        if pagination.is_some() {
            self.pagination = pagination;
        }
        self.loading = false;
        self.error = None;
    }

    /// Record a failed fetch; loaded items stay untouched
    pub fn fail(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.error = Some(error.into());
    }

    /// Abandon an in-flight fetch without recording an error
    pub fn abandon(&mut self) {
        self.loading = false;
    }

    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Remove matching items, returning how many were removed
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !pred(item));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(offset: u32, limit: u32, total: u64) -> Pagination {
        Pagination {
            total,
            limit,
            offset,
            has_more: ((offset + limit) as u64) < total,
        }
    }

    #[test]
    fn test_offset_zero_replaces() {
        let mut list = PagedList::default();
        list.apply_page(0, vec![1, 2], Some(page(0, 2, 4)));
        list.apply_page(0, vec![9], Some(page(0, 2, 1)));
        assert_eq!(list.items, vec![9]);
    }

    #[test]
    fn test_nonzero_offset_appends_in_order() {
        let mut list = PagedList::default();
        list.apply_page(0, vec![1, 2], Some(page(0, 2, 4)));
        list.apply_page(2, vec![3, 4], Some(page(2, 2, 4)));
        assert_eq!(list.items, vec![1, 2, 3, 4]);
        assert!(!list.has_more());
    }

    #[test]
    fn test_next_page_requires_has_more() {
        let mut list: PagedList<u8> = PagedList::default();
        assert_eq!(list.begin_next_page(), None);

        list.apply_page(0, vec![1, 2], Some(page(0, 2, 2)));
        assert_eq!(list.begin_next_page(), None);
        assert!(!list.loading);
    }

    #[test]
    fn test_next_page_claims_loading_once() {
        let mut list = PagedList::default();
        list.apply_page(0, vec![1, 2], Some(page(0, 2, 10)));

        assert_eq!(
            list.begin_next_page(),
            Some(PageRequest { limit: 2, offset: 2 })
        );
        assert!(list.loading);
        // Second claim while the first is in flight is a no-op
        assert_eq!(list.begin_next_page(), None);
    }

    #[test]
    fn test_failure_keeps_items() {
        let mut list = PagedList::default();
        list.apply_page(0, vec!["a"], Some(page(0, 1, 3)));
        list.begin();
        list.fail("Failed to fetch uploads");
        assert_eq!(list.items, vec!["a"]);
        assert_eq!(list.error.as_deref(), Some("Failed to fetch uploads"));
        assert!(!list.loading);
    }

    #[test]
    fn test_prepend_and_remove() {
        let mut list = PagedList::default();
        list.apply_page(0, vec![2, 3], None);
        list.prepend(1);
        assert_eq!(list.items, vec![1, 2, 3]);
        assert_eq!(list.remove_where(|n| *n == 2), 1);
        assert_eq!(list.items, vec![1, 3]);
    }
}
