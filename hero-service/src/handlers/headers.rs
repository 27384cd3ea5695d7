//! Alert and pagination response headers

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::domain::ENTITY_NAME;
use crate::repository::Page;

/// Header carrying the total number of matching records
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Entity lifecycle event reported through alert headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityAlert {
    /// POST succeeded
    Created,
    /// PUT or PATCH succeeded
    Updated,
    /// DELETE succeeded
    Deleted,
}

impl EntityAlert {
    fn message(self, id: i64) -> String {
        match self {
            Self::Created => format!("A new {} is created with identifier {}", ENTITY_NAME, id),
            Self::Updated => format!("A {} is updated with identifier {}", ENTITY_NAME, id),
            Self::Deleted => format!("A {} is deleted with identifier {}", ENTITY_NAME, id),
        }
    }
}

/// `X-{app}-alert` and `X-{app}-params` for an entity event
///
/// An application name that cannot form a header name yields no headers.
pub fn alert_headers(app: &str, alert: EntityAlert, id: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let alert_name = HeaderName::try_from(format!("X-{}-alert", app));
    let params_name = HeaderName::try_from(format!("X-{}-params", app));
    let (Ok(alert_name), Ok(params_name)) = (alert_name, params_name) else {
        tracing::warn!(app, "Application name is not a valid header name");
        return headers;
    };
    if let Ok(value) = HeaderValue::try_from(alert.message(id)) {
        headers.insert(alert_name, value);
    }
    headers.insert(params_name, HeaderValue::from(id));
    headers
}

/// `X-Total-Count` and an RFC 5988 `Link` header for a page
///
/// Links keep every query parameter except `page` and `size`, which are
/// appended with the target page. `next` and `prev` appear only when those
/// pages exist.
pub fn pagination_headers<T>(path: &str, raw_query: Option<&str>, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(page.total));

    let base = link_base(path, raw_query);
    let last = page.total_pages().saturating_sub(1);
    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(link(&base, page.page.saturating_add(1), page.size, "next"));
    }
    if page.has_previous() {
        links.push(link(&base, page.page.saturating_sub(1), page.size, "prev"));
    }
    links.push(link(&base, last, page.size, "last"));
    links.push(link(&base, 0, page.size, "first"));

    match HeaderValue::try_from(links.join(",")) {
        Ok(value) => {
            headers.insert(header::LINK, value);
        }
        Err(e) => tracing::warn!(error = %e, "Skipping unrepresentable Link header"),
    }
    headers
}

fn link_base(path: &str, raw_query: Option<&str>) -> String {
    let kept: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            key != "page" && key != "size"
        })
        .collect();
    if kept.is_empty() {
        format!("{}?", path)
    } else {
        format!("{}?{}&", path, kept.join("&"))
    }
}

fn link(base: &str, page: u64, size: u64, rel: &str) -> String {
    let target = format!("{}page={}&size={}", base, page, size)
        .replace(',', "%2C")
        .replace(';', "%3B");
    format!("<{}>; rel=\"{}\"", target, rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::PageRequest;

    fn page(number: u64, size: u64, total: u64) -> Page<()> {
        Page::new(Vec::new(), &PageRequest::new(number, size), total)
    }

    #[test]
    fn test_alert_headers() {
        let headers = alert_headers("heroApp", EntityAlert::Created, 5);
        assert_eq!(
            headers["x-heroapp-alert"],
            "A new superHero is created with identifier 5"
        );
        assert_eq!(headers["x-heroapp-params"], "5");

        let headers = alert_headers("heroApp", EntityAlert::Deleted, 9);
        assert_eq!(
            headers["x-heroapp-alert"],
            "A superHero is deleted with identifier 9"
        );
    }

    #[test]
    fn test_alert_headers_with_unusable_app_name() {
        assert!(alert_headers("hero app", EntityAlert::Updated, 1).is_empty());
    }

    #[test]
    fn test_middle_page_links() {
        let headers = pagination_headers("/api/super-heroes", Some("page=1&size=2"), &page(1, 2, 5));
        assert_eq!(headers[TOTAL_COUNT_HEADER], "5");
        assert_eq!(
            headers[header::LINK],
            "</api/super-heroes?page=2&size=2>; rel=\"next\",\
             </api/super-heroes?page=0&size=2>; rel=\"prev\",\
             </api/super-heroes?page=2&size=2>; rel=\"last\",\
             </api/super-heroes?page=0&size=2>; rel=\"first\""
        );
    }

    #[test]
    fn test_single_page_has_only_last_and_first() {
        let headers = pagination_headers("/api/super-heroes", None, &page(0, 20, 3));
        let link = headers[header::LINK].to_str().unwrap();
        assert!(!link.contains("rel=\"next\""));
        assert!(!link.contains("rel=\"prev\""));
        assert!(link.contains("page=0&size=20>; rel=\"last\""));
    }

    #[test]
    fn test_empty_result_points_last_at_first_page() {
        let headers = pagination_headers("/api/super-heroes", None, &page(0, 20, 0));
        assert_eq!(headers[TOTAL_COUNT_HEADER], "0");
        assert!(headers[header::LINK]
            .to_str()
            .unwrap()
            .starts_with("</api/super-heroes?page=0&size=20>; rel=\"last\""));
    }

    #[test]
    fn test_links_keep_filters_and_escape_commas() {
        let headers = pagination_headers(
            "/api/super-heroes",
            Some("name.in=Storm,Rogue&page=0&sort=age,desc&size=1"),
            &page(0, 1, 2),
        );
        let link = headers[header::LINK].to_str().unwrap();
        assert!(link.starts_with(
            "</api/super-heroes?name.in=Storm%2CRogue&sort=age%2Cdesc&page=1&size=1>; rel=\"next\""
        ));
    }
}
