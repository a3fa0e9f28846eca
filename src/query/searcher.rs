use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use super::format::ResultFormat;
use super::intersect::Intersection;
use super::request::SearchRequest;
use crate::error::Result;
use crate::index::{DocOrdinal, LoadedIndex, Term};
use crate::tokenizer::{SegmentToken, Segmenter};

/// Per-stage timings of one query, in microseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub parse_us: u64,
    pub segment_us: u64,
    pub search_us: u64,
}

impl QueryStats {
    pub fn total_us(&self) -> u64 {
        self.parse_us + self.segment_us + self.search_us
    }
}

/// Outcome of one query: the requested page of matches plus the total
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub tokens: Vec<String>,
    /// Every match that passed the filter, not just the returned page
    pub total_found: usize,
    pub docs: Vec<DocOrdinal>,
    pub stats: QueryStats,
}

/// Answers queries against a loaded index.
///
/// The index is shared read-only; the only lock is the one serializing a
/// non-reentrant segmenter.
pub struct Searcher {
    index: Arc<LoadedIndex>,
    segmenter: Box<dyn Segmenter>,
    segment_lock: Option<Mutex<()>>,
}

impl Searcher {
    pub fn new(index: Arc<LoadedIndex>, segmenter: Box<dyn Segmenter>) -> Self {
        let segment_lock = (!segmenter.is_reentrant()).then(|| Mutex::new(()));
        Self {
            index,
            segmenter,
            segment_lock,
        }
    }

    pub fn index(&self) -> &LoadedIndex {
        &self.index
    }

    /// Segment query text. A failing segmenter yields no tokens.
    pub fn segment(&self, text: &str) -> Vec<SegmentToken> {
        let result = match &self.segment_lock {
            Some(lock) => {
                let _guard = lock.lock();
                self.segmenter.segment(text)
            }
            None => self.segmenter.segment(text),
        };

        result.unwrap_or_else(|e| {
            warn!("cannot segment query '{}': {}", text, e);
            Vec::new()
        })
    }

    pub fn search(&self, request: &SearchRequest) -> SearchResponse {
        let parse_start = Instant::now();
        let filter = request.filter.resolve(self.index.attributes());
        let parse_us = parse_start.elapsed().as_micros() as u64;

        let segment_start = Instant::now();
        let tokens: Vec<String> = self
            .segment(&request.query)
            .into_iter()
            .map(|t| t.text)
            .collect();
        let segment_us = segment_start.elapsed().as_micros() as u64;

        let search_start = Instant::now();
        let terms: Vec<Term> = tokens.iter().map(Term::new).collect();
        let page_end = request.offset.saturating_add(request.limit);
        let mut total_found = 0;
        let mut docs = Vec::new();

        for ordinal in Intersection::for_terms(&self.index, &terms) {
            let keep = self
                .index
                .document(ordinal)
                .is_some_and(|doc| filter.matches(&doc));
            if !keep {
                continue;
            }
            if total_found >= request.offset && total_found < page_end {
                docs.push(ordinal);
            }
            total_found += 1;
        }
        let search_us = search_start.elapsed().as_micros() as u64;

        let stats = QueryStats {
            parse_us,
            segment_us,
            search_us,
        };
        info!(
            "[query {}] [total_found {}] [return_num {}] [cost({} {} {}) {}us]",
            request.query,
            total_found,
            docs.len(),
            stats.parse_us,
            stats.segment_us,
            stats.search_us,
            stats.total_us()
        );

        SearchResponse {
            query: request.query.clone(),
            tokens,
            total_found,
            docs,
            stats,
        }
    }

    /// Parse a raw HTTP request, search and render the reply body
    pub fn handle_http(&self, method: &str, uri: &str, body: &str) -> Result<(ResultFormat, String)> {
        let parse_start = Instant::now();
        let request = SearchRequest::from_http(method, uri, body)?;
        let parse_us = parse_start.elapsed().as_micros() as u64;

        let mut response = self.search(&request);
        response.stats.parse_us += parse_us;

        let format = ResultFormat::from_name(&request.dataformat);
        let reply = format.render(&response, self.index.attributes())?;
        Ok((format, reply))
    }
}
