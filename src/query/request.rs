//! Search requests as received from the HTTP boundary

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filter::AttrFilter;
use crate::config::SearchSettings;
use crate::error::{Result, SieveError};

/// One search request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Index selector, not interpreted by the searcher
    pub index: String,
    pub charset: String,
    /// Requested output format, lowercased
    pub dataformat: String,
    pub limit: usize,
    pub offset: usize,
    #[serde(skip)]
    pub filter: AttrFilter,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            index: "*".to_string(),
            charset: "utf8".to_string(),
            dataformat: "xml".to_string(),
            limit: 4000,
            offset: 0,
            filter: AttrFilter::new(),
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Defaults taken from search settings instead of the built-in ones
    pub fn with_settings(query: impl Into<String>, settings: &SearchSettings) -> Self {
        Self {
            query: query.into(),
            dataformat: settings.default_format.to_lowercase(),
            limit: settings.default_limit,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter.merge_str(filter);
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.dataformat = format.to_lowercase();
        self
    }

    /// Parse `key=value&key=value` pairs.
    ///
    /// Keys and values are trimmed, unknown keys are ignored and repeated
    /// `filter` keys merge. Non-numeric `limit` or `offset` become 0.
    pub fn parse_query_string(text: &str) -> Result<Self> {
        let mut request = Self::default();
        let mut seen = 0;

        for pair in text.split('&').filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                debug!("skipping request parameter without '=': '{}'", pair);
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                continue;
            }
            seen += 1;

            match key {
                "query" => request.query = value.to_string(),
                "index" => request.index = value.to_string(),
                "charset" => request.charset = value.to_string(),
                "dataformat" => request.dataformat = value.to_lowercase(),
                "limit" => request.limit = parse_count(value),
                "offset" => request.offset = parse_count(value),
                "filter" => {
                    request.filter.merge_str(value);
                }
                _ => debug!("ignoring request parameter '{}'", key),
            }
        }

        if seen == 0 {
            return Err(SieveError::InvalidRequest(format!(
                "no parameters in '{}'",
                text
            )));
        }
        Ok(request)
    }

    /// Parse a GET uri of the form `/?<params>` or a POST body
    pub fn from_http(method: &str, uri: &str, body: &str) -> Result<Self> {
        match method {
            "GET" => {
                let params = uri.strip_prefix("/?").ok_or_else(|| {
                    SieveError::InvalidRequest(format!("unexpected uri '{}'", uri))
                })?;
                Self::parse_query_string(params)
            }
            "POST" => Self::parse_query_string(body),
            other => Err(SieveError::InvalidRequest(format!(
                "unsupported method '{}'",
                other
            ))),
        }
    }
}

/// Leading decimal digits, 0 when there are none
fn parse_count(value: &str) -> usize {
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = SearchRequest::parse_query_string("query=rust").unwrap();
        assert_eq!(request.query, "rust");
        assert_eq!(request.index, "*");
        assert_eq!(request.charset, "utf8");
        assert_eq!(request.dataformat, "xml");
        assert_eq!(request.limit, 4000);
        assert_eq!(request.offset, 0);
        assert!(request.filter.is_empty());
    }

    #[test]
    fn test_all_parameters() {
        let request = SearchRequest::parse_query_string(
            "query= cat dog &index=books&dataformat=JSON&limit=10&offset=20&charset=gbk&color=red",
        )
        .unwrap();
        assert_eq!(request.query, "cat dog");
        assert_eq!(request.index, "books");
        assert_eq!(request.dataformat, "json");
        assert_eq!(request.limit, 10);
        assert_eq!(request.offset, 20);
        assert_eq!(request.charset, "gbk");
    }

    #[test]
    fn test_non_numeric_counts() {
        let request = SearchRequest::parse_query_string("limit=abc&offset=12x").unwrap();
        assert_eq!(request.limit, 0);
        assert_eq!(request.offset, 12);
    }

    #[test]
    fn test_filters_merge() {
        let request = SearchRequest::parse_query_string(
            "query=x&filter=category:fiction;year:1999&filter=category:drama",
        )
        .unwrap();
        assert_eq!(
            request.filter.get("category").unwrap(),
            &["fiction", "drama"]
        );
        assert_eq!(request.filter.get("year").unwrap(), &["1999"]);
    }

    #[test]
    fn test_empty_request_rejected() {
        assert!(SearchRequest::parse_query_string("").is_err());
        assert!(SearchRequest::parse_query_string("&&novalue").is_err());
    }

    #[test]
    fn test_from_http() {
        let get = SearchRequest::from_http("GET", "/?query=cat&limit=5", "").unwrap();
        assert_eq!(get.query, "cat");
        assert_eq!(get.limit, 5);

        let post = SearchRequest::from_http("POST", "/search", "query=dog").unwrap();
        assert_eq!(post.query, "dog");

        assert!(SearchRequest::from_http("GET", "/search?query=cat", "").is_err());
        assert!(SearchRequest::from_http("PUT", "/?query=cat", "").is_err());
    }

    #[test]
    fn test_builders() {
        let settings = SearchSettings {
            default_limit: 20,
            default_format: "JSON".to_string(),
            sort_terms_on_write: true,
        };
        let request = SearchRequest::with_settings("cat", &settings)
            .with_page(5, 10)
            .with_filter("category:fiction");
        assert_eq!(request.dataformat, "json");
        assert_eq!((request.offset, request.limit), (5, 10));
        assert_eq!(request.filter.len(), 1);
    }
}
