//! Paging and ordering for repository queries
//!
//! Pages are 0-based. A [`PageRequest`] without explicit sort orders by `id`
//! ascending so page boundaries stay stable.
//!
//! # Example
//!
//! ```rust
//! use hero_service::repository::{OrderDirection, PageRequest, Sort, SuperHeroField};
//!
//! let request = PageRequest::new(2, 20).with_sort(Sort::desc(SuperHeroField::Age));
//! assert_eq!(request.offset(), 40);
//! assert_eq!(request.sort[0].direction, OrderDirection::Descending);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::filter::SuperHeroField;
use crate::domain::SuperHero;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order, nulls last
    #[default]
    Ascending,
    /// Sort in descending order, nulls first
    Descending,
}

impl OrderDirection {
    /// Parse `asc` / `desc`, ignoring ASCII case
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Ascending)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Descending)
        } else {
            None
        }
    }

    /// SQL keyword for this direction
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// Field to order by
    pub field: SuperHeroField,
    /// Direction
    pub direction: OrderDirection,
}

impl Sort {
    /// Ascending order on a field
    pub const fn asc(field: SuperHeroField) -> Self {
        Self {
            field,
            direction: OrderDirection::Ascending,
        }
    }

    /// Descending order on a field
    pub const fn desc(field: SuperHeroField) -> Self {
        Self {
            field,
            direction: OrderDirection::Descending,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction)
    }
}

/// A page number, page size and sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page: u64,
    /// Maximum number of items in the page
    pub size: u64,
    /// Sort keys, most significant first
    pub sort: Vec<Sort>,
}

impl PageRequest {
    /// Request a page without explicit sort
    #[must_use]
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Append a sort key
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// Sort keys followed by `id` ascending as a tie-breaker
    pub fn effective_sort(&self) -> Vec<Sort> {
        let mut keys = self.sort.clone();
        if !keys.iter().any(|key| key.field == SuperHeroField::Id) {
            keys.push(Sort::asc(SuperHeroField::Id));
        }
        keys
    }

    /// Order two entities by the effective sort keys
    pub fn compare(&self, a: &SuperHero, b: &SuperHero) -> Ordering {
        compare_by(&self.effective_sort(), a, b)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Order two entities by a list of sort keys
///
/// Descending keys reverse the whole comparison, so nulls come first, as in
/// Postgres.
pub fn compare_by(keys: &[Sort], a: &SuperHero, b: &SuperHero) -> Ordering {
    keys.iter()
        .map(|key| {
            let ordering = key.field.compare(a, b);
            match key.direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub content: Vec<T>,
    /// 0-based page index
    pub page: u64,
    /// Requested page size
    pub size: u64,
    /// Number of items across all pages
    pub total: u64,
}

impl<T> Page<T> {
    /// Build a page for a request
    pub fn new(content: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total,
        }
    }

    /// Number of pages needed for `total` items
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return if self.total == 0 { 0 } else { 1 };
        }
        self.total.div_ceil(self.size)
    }

    /// Whether a following page exists
    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages()
    }

    /// Whether a preceding page exists
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Convert every item, keeping page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_parse() {
        assert_eq!(OrderDirection::parse("asc"), Some(OrderDirection::Ascending));
        assert_eq!(OrderDirection::parse("DESC"), Some(OrderDirection::Descending));
        assert_eq!(OrderDirection::parse("up"), None);
        assert_eq!(OrderDirection::Descending.as_sql(), "DESC");
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
        assert_eq!(PageRequest::default().size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_effective_sort_adds_id_tiebreaker() {
        let request = PageRequest::default().with_sort(Sort::desc(SuperHeroField::Age));
        assert_eq!(
            request.effective_sort(),
            vec![Sort::desc(SuperHeroField::Age), Sort::asc(SuperHeroField::Id)]
        );

        let by_id = PageRequest::default().with_sort(Sort::desc(SuperHeroField::Id));
        assert_eq!(by_id.effective_sort(), vec![Sort::desc(SuperHeroField::Id)]);
    }

    #[test]
    fn test_compare_descending_puts_nulls_first() {
        let aged = SuperHero::new().with_id(1).with_age(10);
        let ageless = SuperHero::new().with_id(2);
        let request = PageRequest::default().with_sort(Sort::desc(SuperHeroField::Age));
        assert_eq!(request.compare(&ageless, &aged), Ordering::Less);

        let request = PageRequest::default().with_sort(Sort::asc(SuperHeroField::Age));
        assert_eq!(request.compare(&ageless, &aged), Ordering::Greater);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page::new(vec![1, 2], &PageRequest::new(0, 2), 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());

        let last = Page::new(vec![5], &PageRequest::new(2, 2), 5);
        assert!(!last.has_next());
        assert!(last.has_previous());

        let empty: Page<i32> = Page::new(vec![], &PageRequest::new(0, 20), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_last_possible_page_has_no_next() {
        let page: Page<i32> = Page::new(vec![], &PageRequest::new(u64::MAX, 20), 3);
        assert!(!page.has_next());
        assert!(page.has_previous());
        assert_eq!(PageRequest::new(u64::MAX, 20).offset(), u64::MAX);
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], &PageRequest::new(1, 2), 4).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 4);
    }
}
