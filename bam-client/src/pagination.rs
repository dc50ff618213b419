//! Following a HAL envelope's `_links.next` until it runs out, a caller
//! supplied cap is hit, or the same `(endpoint, query)` key recurs (which
//! would otherwise spin forever on a self-referential `next` link).

use std::collections::HashSet;

use bam_errors::{BamError, BamResult};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct PageLimits {
    pub max_items: Option<usize>,
    pub max_pages: Option<usize>,
}

/// One page's parsed HAL envelope: the collection items (whichever of
/// `data` or `_embedded.<collection>` is present) and the next-page URL.
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

pub fn parse_page(body: &Value, embedded_collection: &str) -> Page {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| {
            body.get("_embedded")
                .and_then(|embedded| embedded.get(embedded_collection))
                .and_then(Value::as_array)
        })
        .cloned()
        .unwrap_or_default();

    let next = body
        .get("_links")
        .and_then(|links| links.get("next"))
        .and_then(|next| next.get("href"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Page { items, next }
}

/// Tracks visited `(endpoint, sorted-query)` keys across a single paginated
/// walk; `visit` returns an error if the same key is seen twice.
#[derive(Debug, Default)]
pub struct PaginationGuard {
    seen: HashSet<String>,
}

impl PaginationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self, endpoint: &str, query: &str) -> BamResult<()> {
        let mut parts: Vec<&str> = query.split('&').filter(|s| !s.is_empty()).collect();
        parts.sort_unstable();
        let key = format!("{endpoint}?{}", parts.join("&"));
        if !self.seen.insert(key) {
            return Err(BamError::Fatal {
                row_id: String::new(),
                message: format!("pagination loop detected following `_links.next` from {endpoint}"),
            });
        }
        Ok(())
    }
}

/// Whether the walk should stop given the items collected so far and the
/// caller's limits.
pub fn should_stop(items_so_far: usize, pages_so_far: usize, limits: &PageLimits) -> bool {
    limits.max_items.is_some_and(|max| items_so_far >= max)
        || limits.max_pages.is_some_and(|max| pages_so_far >= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_data_array_envelope() {
        let body = json!({"data": [{"id": 1}, {"id": 2}], "_links": {}});
        let page = parse_page(&body, "ignored");
        assert_eq!(page.items.len(), 2);
        assert!(page.next.is_none());
    }

    #[test]
    fn parses_embedded_collection_envelope_with_next_link() {
        let body = json!({
            "_embedded": {"networks": [{"id": 1}]},
            "_links": {"next": {"href": "/networks?start=10"}},
        });
        let page = parse_page(&body, "networks");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next.as_deref(), Some("/networks?start=10"));
    }

    #[test]
    fn guard_rejects_repeated_endpoint_query_pair() {
        let mut guard = PaginationGuard::new();
        guard.visit("/networks", "start=10&count=100").unwrap();
        guard.visit("/networks", "count=100&start=10").unwrap_err();
    }

    #[test]
    fn stop_conditions_respect_item_and_page_caps() {
        let limits = PageLimits { max_items: Some(50), max_pages: None };
        assert!(!should_stop(10, 1, &limits));
        assert!(should_stop(50, 1, &limits));
    }
}
