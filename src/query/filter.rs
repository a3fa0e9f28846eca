//! Attribute allow-list filters
//!
//! A filter maps attribute names to sets of allowed values. Names are
//! resolved against the attribute catalogues once per query; each matched
//! document's value is stringified and looked up in the allowed set.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::index::{AttrKind, AttributeStore, DocumentRef};

/// Attribute name to allowed values, as sent by the caller
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrFilter {
    entries: BTreeMap<String, Vec<String>>,
}

impl AttrFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name:v1,v2;name2:v3`
    pub fn parse(text: &str) -> Self {
        let mut filter = Self::new();
        filter.merge_str(text);
        filter
    }

    /// Merge the entries of a filter string, returning how many were kept.
    ///
    /// A piece without exactly one `:` or without any value is skipped.
    pub fn merge_str(&mut self, text: &str) -> usize {
        let mut kept = 0;
        for piece in text.split(';').filter(|p| !p.trim().is_empty()) {
            let mut parts = piece.split(':');
            let (Some(name), Some(values), None) = (parts.next(), parts.next(), parts.next()) else {
                debug!("skipping malformed filter piece '{}'", piece);
                continue;
            };

            let name = name.trim();
            let values: Vec<&str> = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if name.is_empty() || values.is_empty() {
                debug!("skipping empty filter piece '{}'", piece);
                continue;
            }

            self.allow(name, values);
            kept += 1;
        }
        kept
    }

    /// Add allowed values for an attribute
    pub fn allow<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.entries
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind names to columns. Names no catalogue knows are dropped.
    pub fn resolve(&self, attributes: &AttributeStore) -> ResolvedFilter {
        let clauses = self
            .entries
            .iter()
            .filter_map(|(name, values)| match attributes.resolve(name) {
                Some((kind, offset)) => Some(FilterClause {
                    kind,
                    offset,
                    allowed: values.iter().cloned().collect(),
                }),
                None => {
                    warn!("filter attribute '{}' is not indexed, ignoring", name);
                    None
                }
            })
            .collect();
        ResolvedFilter { clauses }
    }
}

#[derive(Clone, Debug)]
struct FilterClause {
    kind: AttrKind,
    offset: usize,
    allowed: HashSet<String>,
}

/// A filter bound to column kinds and offsets
#[derive(Clone, Debug, Default)]
pub struct ResolvedFilter {
    clauses: Vec<FilterClause>,
}

impl ResolvedFilter {
    /// Whether the document passes every clause.
    ///
    /// A document without a value at a clause's offset is dropped. Multi
    /// columns compare only the value at the offset.
    pub fn matches(&self, doc: &DocumentRef<'_>) -> bool {
        self.clauses.iter().all(|clause| {
            doc.value_string(clause.kind, clause.offset)
                .is_some_and(|value| clause.allowed.contains(&value))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSchema;
    use crate::index::{AttrRecord, DocOrdinal};

    fn store() -> AttributeStore {
        let schema = SourceSchema::new()
            .with_uint("year")
            .with_float("price")
            .with_multi("tags")
            .with_string("category")
            .with_string("year");
        let mut store = AttributeStore::from_schema(&schema);
        store.push_document(AttrRecord {
            uint: vec![1999],
            float: vec![9.5],
            multi: vec![3, 4],
            string: vec!["drama".into(), "old".into()],
        });
        store.push_document(AttrRecord {
            uint: vec![2021],
            float: vec![12.0],
            multi: vec![],
            string: vec!["fiction".into(), "new".into()],
        });
        store
    }

    fn retained(filter: &AttrFilter, store: &AttributeStore) -> Vec<u32> {
        let resolved = filter.resolve(store);
        (0..store.doc_count() as u32)
            .filter(|&n| {
                store
                    .document(DocOrdinal(n))
                    .is_some_and(|doc| resolved.matches(&doc))
            })
            .collect()
    }

    #[test]
    fn test_parse_and_merge() {
        let mut filter = AttrFilter::parse("category:fiction,drama;year:2021");
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("category").unwrap(), &["fiction", "drama"]);

        assert_eq!(filter.merge_str("year:1999;bad;a:b:c;empty:;:x"), 1);
        assert_eq!(filter.get("year").unwrap(), &["2021", "1999"]);
        assert!(filter.get("bad").is_none());
        assert!(filter.get("a").is_none());
        assert!(filter.get("empty").is_none());
    }

    #[test]
    fn test_string_filter() {
        let store = store();
        assert_eq!(retained(&AttrFilter::parse("category:fiction"), &store), vec![1]);
        assert_eq!(retained(&AttrFilter::parse("category:drama,fiction"), &store), vec![0, 1]);
        assert!(retained(&AttrFilter::parse("category:poetry"), &store).is_empty());
    }

    #[test]
    fn test_unsigned_wins_over_string() {
        let store = store();
        // "year" resolves to the unsigned column, not the string one
        assert_eq!(retained(&AttrFilter::parse("year:1999"), &store), vec![0]);
        assert!(retained(&AttrFilter::parse("year:old"), &store).is_empty());
    }

    #[test]
    fn test_float_uses_fixed_precision() {
        let store = store();
        assert_eq!(retained(&AttrFilter::parse("price:9.500000"), &store), vec![0]);
        assert!(retained(&AttrFilter::parse("price:9.5"), &store).is_empty());
    }

    #[test]
    fn test_multi_compares_single_offset() {
        let store = store();
        assert_eq!(retained(&AttrFilter::parse("tags:3"), &store), vec![0]);
        // 4 sits at offset 1, never compared
        assert!(retained(&AttrFilter::parse("tags:4"), &store).is_empty());
    }

    #[test]
    fn test_unknown_name_never_drops() {
        let store = store();
        let filter = AttrFilter::parse("nope:1");
        assert!(filter.resolve(&store).is_empty());
        assert_eq!(retained(&filter, &store), vec![0, 1]);
    }

    #[test]
    fn test_idempotent() {
        let store = store();
        let filter = AttrFilter::parse("category:fiction;year:2021");
        let once = retained(&filter, &store);
        assert_eq!(retained(&filter, &store), once);
        assert_eq!(once, vec![1]);
    }
}
