//! Paging and sorting parameters for list endpoints
//!
//! `page` is 0-based. `size` defaults to [`DEFAULT_PAGE_SIZE`] and is clamped
//! to [`MAX_PAGE_SIZE`]. `sort` may repeat; each value is
//! `field[,field...][,asc|desc]`, the direction applying to every field named
//! before it.
//!
//! ```rust
//! use hero_service::handlers::page_request_from_pairs;
//! use hero_service::repository::{OrderDirection, SuperHeroField};
//!
//! let pairs = vec![
//!     ("page".to_string(), "2".to_string()),
//!     ("sort".to_string(), "age,desc".to_string()),
//! ];
//! let request = page_request_from_pairs(&pairs)?;
//! assert_eq!(request.page, 2);
//! assert_eq!(request.size, 20);
//! assert_eq!(request.sort[0].field, SuperHeroField::Age);
//! assert_eq!(request.sort[0].direction, OrderDirection::Descending);
//! # Ok::<(), hero_service::criteria::CriteriaError>(())
//! ```

use crate::criteria::CriteriaError;
use crate::repository::{OrderDirection, PageRequest, Sort, SuperHeroField, DEFAULT_PAGE_SIZE};

/// Largest page a client may request
pub const MAX_PAGE_SIZE: u64 = 2000;

/// Build a [`PageRequest`] from raw query pairs, ignoring non-paging keys
pub fn page_request_from_pairs(pairs: &[(String, String)]) -> Result<PageRequest, CriteriaError> {
    let mut request = PageRequest::default();
    for (key, value) in pairs {
        match key.as_str() {
            "page" => request.page = parse_number(key, value)?,
            "size" => {
                request.size = match parse_number(key, value)? {
                    0 => DEFAULT_PAGE_SIZE,
                    size => size.min(MAX_PAGE_SIZE),
                }
            }
            "sort" => request.sort.extend(parse_sort(value)?),
            _ => {}
        }
    }
    Ok(request)
}

fn parse_number(key: &str, value: &str) -> Result<u64, CriteriaError> {
    value
        .trim()
        .parse()
        .map_err(|_| CriteriaError::InvalidPaging(format!("{}={}", key, value)))
}

fn parse_sort(value: &str) -> Result<Vec<Sort>, CriteriaError> {
    let mut tokens: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    let direction = match tokens.last().and_then(|last| OrderDirection::parse(last)) {
        Some(direction) => {
            tokens.pop();
            direction
        }
        None => OrderDirection::default(),
    };

    tokens
        .into_iter()
        .map(|name| {
            SuperHeroField::from_name(name)
                .map(|field| Sort { field, direction })
                .ok_or_else(|| CriteriaError::InvalidPaging(format!("sort={}", value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let request = page_request_from_pairs(&pairs(&[("name.equals", "Storm")])).unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_size_is_clamped() {
        let request = page_request_from_pairs(&pairs(&[("size", "5000")])).unwrap();
        assert_eq!(request.size, MAX_PAGE_SIZE);

        let request = page_request_from_pairs(&pairs(&[("size", "0")])).unwrap();
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_non_numeric_paging_is_rejected() {
        let err = page_request_from_pairs(&pairs(&[("page", "first")])).unwrap_err();
        assert_eq!(err, CriteriaError::InvalidPaging("page=first".to_string()));
        assert!(page_request_from_pairs(&pairs(&[("size", "-1")])).is_err());
    }

    #[test]
    fn test_repeated_sort_parameters() {
        let request = page_request_from_pairs(&pairs(&[
            ("sort", "name,age,desc"),
            ("sort", "id"),
        ]))
        .unwrap();
        assert_eq!(
            request.sort,
            vec![
                Sort::desc(SuperHeroField::Name),
                Sort::desc(SuperHeroField::Age),
                Sort::asc(SuperHeroField::Id),
            ]
        );
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let err = page_request_from_pairs(&pairs(&[("sort", "password,asc")])).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidPaging(_)));
    }

    #[test]
    fn test_empty_sort_is_ignored() {
        let request = page_request_from_pairs(&pairs(&[("sort", "")])).unwrap();
        assert!(request.sort.is_empty());
    }
}
