//! Query-time pipeline
//!
//! A request flows through four stages:
//!
//! 1. `SearchRequest`: parsed from the HTTP query string or POST body
//! 2. segmentation of the query text into terms
//! 3. `Intersection`: documents present in every term's posting list
//! 4. `ResolvedFilter`: attribute allow-lists applied per document
//!
//! The `Searcher` runs the stages and `ResultFormat` renders the reply.
//!
//! # Example
//!
//! ```text
//! GET /?query=rust+book&filter=category:fiction,drama;year:2021&limit=20&dataformat=json
//! ```

pub mod filter;
pub mod format;
pub mod intersect;
pub mod request;
pub mod searcher;

pub use filter::{AttrFilter, ResolvedFilter};
pub use format::ResultFormat;
pub use intersect::{Intersection, PostingCursor};
pub use request::SearchRequest;
pub use searcher::{QueryStats, SearchResponse, Searcher};
