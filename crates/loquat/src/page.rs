//! Page request / page result types used by the pagination merger.

/// Page size applied when a request asks for zero rows.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A request for one page of results. Page indexes are zero-based: index 0
/// with size 10 covers rows 0..10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: u64,
    size: u64,
    total: Option<u64>,
}

impl PageRequest {
    pub fn new(index: u64, size: u64) -> Self {
        Self {
            index,
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
            total: None,
        }
    }

    /// Reuse a total already known from a previous page, skipping the COUNT
    /// round-trips entirely.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Absolute offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        self.index * self.size
    }
}

/// One page of results plus the bookkeeping needed to render pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub index: u64,
    pub size: u64,
    pub total_elements: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total_elements: u64, data: Vec<T>) -> Self {
        Self {
            index: request.index(),
            size: request.size(),
            total_elements,
            data,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(request, 0, Vec::new())
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(self.size)
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            index: self.index,
            size: self.size,
            total_elements: self.total_elements,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 30);
    }

    #[test]
    fn zero_size_falls_back_to_default() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<i32> = Page::new(PageRequest::new(0, 4), 18, vec![]);
        assert_eq!(page.total_pages(), 5);
        assert!(page.has_next());

        let last: Page<i32> = Page::new(PageRequest::new(4, 4), 18, vec![]);
        assert!(!last.has_next());
    }

    #[test]
    fn cached_total_is_carried() {
        let request = PageRequest::new(1, 4).with_total(18);
        assert_eq!(request.total(), Some(18));
        assert_eq!(PageRequest::new(1, 4).total(), None);
    }

    #[test]
    fn map_preserves_bookkeeping() {
        let page = Page::new(PageRequest::new(1, 2), 5, vec![1, 2]);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.index, 1);
        assert_eq!(mapped.total_elements, 5);
        assert_eq!(mapped.data, vec!["1".to_string(), "2".to_string()]);
    }
}
