//! Search request descriptions.

use std::fmt;

use url::form_urlencoded;

/// One search request: term, page and page size.
///
/// Two equal queries describe the same request, so a `SearchQuery` doubles
/// as the key that decides whether a new fetch is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    term: String,
    page: u32,
    limit: u32,
}

impl SearchQuery {
    /// Build a query. `page` is clamped to at least 1 and `limit` to at least 1.
    #[must_use]
    pub fn new(term: impl Into<String>, page: u32, limit: u32) -> Self {
        Self {
            term: term.into(),
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// The search term, possibly empty.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Products per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Offset of the first product on this page.
    #[must_use]
    pub const fn skip(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Query string pairs in the order the API documents them.
    #[must_use]
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("q", self.term.clone()),
            ("limit", self.limit.to_string()),
            ("skip", self.skip().to_string()),
        ]
    }

    /// Serialized form, e.g. `products/search?q=phone&limit=20&skip=0`.
    #[must_use]
    pub fn key(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.params() {
            serializer.append_pair(name, &value);
        }
        format!("products/search?{}", serializer.finish())
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
