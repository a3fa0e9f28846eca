//! Sieve: a compact full-text search core
//!
//! Rows from a source are inverted into term posting lists plus four typed
//! attribute columns, written to disk once, then loaded read-only to answer
//! conjunctive keyword queries with attribute filters.

pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod source;
pub mod tokenizer;

pub use config::{IndexSettings, SearchSettings, SieveConfig, SourceSchema, TokenizerConfig};
pub use error::{Result, SieveError};
pub use index::{build_index, BuiltIndex, DocOrdinal, IndexBuilder, LoadedIndex, Term};
pub use query::{AttrFilter, ResultFormat, SearchRequest, SearchResponse, Searcher};
pub use source::{JsonLinesSource, MemorySource, Row, RowSource};
pub use tokenizer::{Segmenter, Tokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
