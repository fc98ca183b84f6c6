//! Lenient page-number pagination.

/// One page of a result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    /// Number of items per catalog page.
    pub const CATALOG_PER_PAGE: i64 = 12;

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub const fn previous_page_number(&self) -> i64 {
        self.number - 1
    }

    #[must_use]
    pub const fn next_page_number(&self) -> i64 {
        self.number + 1
    }

    /// Every page number, for the page links.
    #[must_use]
    pub fn page_range(&self) -> Vec<i64> {
        (1..=self.num_pages).collect()
    }
}

/// Number of pages needed for `total` items; always at least one.
#[must_use]
pub const fn num_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Resolve a raw `page` query value against the page count.
///
/// Missing or non-numeric values give page 1; numbers outside `1..=last`
/// give the last page.
#[must_use]
pub fn resolve_page(raw: Option<&str>, num_pages: i64) -> i64 {
    let last = num_pages.max(1);
    match raw.map(str::trim).and_then(|value| value.parse::<i64>().ok()) {
        Some(number) if (1..=last).contains(&number) => number,
        Some(_) => last,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0, 12), 1);
        assert_eq!(num_pages(12, 12), 1);
        assert_eq!(num_pages(13, 12), 2);
        assert_eq!(num_pages(25, 12), 3);
    }

    #[test]
    fn test_resolve_page_defaults_to_first() {
        assert_eq!(resolve_page(None, 3), 1);
        assert_eq!(resolve_page(Some("abc"), 3), 1);
        assert_eq!(resolve_page(Some(""), 3), 1);
    }

    #[test]
    fn test_resolve_page_clamps_to_last() {
        assert_eq!(resolve_page(Some("2"), 3), 2);
        assert_eq!(resolve_page(Some("99"), 3), 3);
        assert_eq!(resolve_page(Some("0"), 3), 3);
        assert_eq!(resolve_page(Some("-1"), 3), 3);
        assert_eq!(resolve_page(Some("5"), 0), 1);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page {
            items: vec![1, 2, 3],
            number: 2,
            num_pages: 3,
            total: 27,
        };
        assert!(page.has_previous());
        assert!(page.has_next());
        assert_eq!(page.previous_page_number(), 1);
        assert_eq!(page.next_page_number(), 3);
        assert_eq!(page.page_range(), vec![1, 2, 3]);
    }
}
