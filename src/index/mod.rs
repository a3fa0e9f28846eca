//! Inverted index and attribute columns
//!
//! An index is built once from a row source and then loaded read-only.
//!
//! # Architecture
//!
//! - `Inverter`: hash-backed multimap, used for field hits and postings
//! - `AttributeStore`: four typed per-document columns plus their catalogues
//! - `IndexBuilder`: turns rows into postings and attribute records
//! - `codec`: on-disk layout of the index file and the attribute files
//! - `LoadedIndex`: the read-only in-memory index used at query time

mod fingerprint;
mod types;
mod inverter;
mod attributes;
mod builder;
pub mod codec;
mod reader;

pub use fingerprint::*;
pub use types::*;
pub use inverter::*;
pub use attributes::*;
pub use builder::*;
pub use reader::*;
