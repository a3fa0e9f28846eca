//! Per-document attribute columns
//!
//! Four independent columns, one per value kind. Each column holds one
//! record per document ordinal; a record is the list of that document's
//! values for the kind, in catalogue order (multi records hold every value
//! parsed from every multi attribute, concatenated).

use std::fmt;

use super::types::DocOrdinal;
use crate::config::SourceSchema;
use crate::error::{Result, SieveError};

/// Attribute value kinds, in filter resolution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Uint,
    Float,
    Multi,
    String,
}

impl AttrKind {
    pub const ALL: [AttrKind; 4] = [
        AttrKind::Uint,
        AttrKind::Float,
        AttrKind::Multi,
        AttrKind::String,
    ];

    fn index(self) -> usize {
        match self {
            AttrKind::Uint => 0,
            AttrKind::Float => 1,
            AttrKind::Multi => 2,
            AttrKind::String => 3,
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            AttrKind::Uint => "lcu",
            AttrKind::Float => "lcf",
            AttrKind::Multi => "lcm",
            AttrKind::String => "lcs",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrKind::Uint => "unsigned",
            AttrKind::Float => "float",
            AttrKind::Multi => "multi",
            AttrKind::String => "string",
        };
        f.write_str(name)
    }
}

/// Ordered attribute names for one column kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrCatalogue {
    names: Vec<String>,
}

impl AttrCatalogue {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, offset: usize) -> Option<&str> {
        self.names.get(offset).map(String::as_str)
    }

    /// Offset of the first attribute with this name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One column: a record of values per document ordinal
#[derive(Clone, Debug, PartialEq)]
pub struct AttrColumn<T> {
    records: Vec<Vec<T>>,
}

impl<T> AttrColumn<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append the record for the next ordinal
    pub fn push(&mut self, record: Vec<T>) -> DocOrdinal {
        let ordinal = DocOrdinal(self.records.len() as u32);
        self.records.push(record);
        ordinal
    }

    /// Record for an ordinal, empty when out of range
    pub fn get(&self, ordinal: DocOrdinal) -> &[T] {
        self.records
            .get(ordinal.as_usize())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn records(&self) -> &[Vec<T>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for AttrColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<Vec<T>>> for AttrColumn<T> {
    fn from(records: Vec<Vec<T>>) -> Self {
        Self { records }
    }
}

/// Attribute values of one document, before they enter the columns
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttrRecord {
    pub uint: Vec<u32>,
    pub float: Vec<f32>,
    pub multi: Vec<u32>,
    pub string: Vec<String>,
}

/// The four attribute columns of an index and their catalogues
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeStore {
    pub uint: AttrColumn<u32>,
    pub float: AttrColumn<f32>,
    pub multi: AttrColumn<u32>,
    pub string: AttrColumn<String>,
    catalogues: [AttrCatalogue; 4],
}

impl AttributeStore {
    /// Empty columns with catalogues taken from the source schema
    pub fn from_schema(schema: &SourceSchema) -> Self {
        let mut store = Self::default();
        for kind in AttrKind::ALL {
            store.catalogues[kind.index()] = AttrCatalogue::new(schema.attributes(kind).to_vec());
        }
        store
    }

    pub fn catalogue(&self, kind: AttrKind) -> &AttrCatalogue {
        &self.catalogues[kind.index()]
    }

    pub fn set_catalogue(&mut self, kind: AttrKind, catalogue: AttrCatalogue) {
        self.catalogues[kind.index()] = catalogue;
    }

    /// Append one document's values to every column
    pub fn push_document(&mut self, record: AttrRecord) -> DocOrdinal {
        let ordinal = self.uint.push(record.uint);
        self.float.push(record.float);
        self.multi.push(record.multi);
        self.string.push(record.string);
        ordinal
    }

    /// Length of a column
    pub fn column_len(&self, kind: AttrKind) -> usize {
        match kind {
            AttrKind::Uint => self.uint.len(),
            AttrKind::Float => self.float.len(),
            AttrKind::Multi => self.multi.len(),
            AttrKind::String => self.string.len(),
        }
    }

    /// Number of documents, checking that all four columns agree
    pub fn validate(&self) -> Result<usize> {
        let expected = self.uint.len();
        for kind in AttrKind::ALL {
            let actual = self.column_len(kind);
            if actual != expected {
                return Err(SieveError::DocCountMismatch {
                    kind,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }

    pub fn doc_count(&self) -> usize {
        self.uint.len()
    }

    /// Resolve an attribute name to its column kind and offset.
    ///
    /// Kinds are tried in unsigned, float, multi, string order and the
    /// first match wins.
    pub fn resolve(&self, name: &str) -> Option<(AttrKind, usize)> {
        AttrKind::ALL.into_iter().find_map(|kind| {
            self.catalogue(kind)
                .position(name)
                .map(|offset| (kind, offset))
        })
    }

    /// Borrowed view of one document's values
    pub fn document(&self, ordinal: DocOrdinal) -> Option<DocumentRef<'_>> {
        if ordinal.as_usize() >= self.doc_count() {
            return None;
        }
        Some(DocumentRef {
            ordinal,
            uint: self.uint.get(ordinal),
            float: self.float.get(ordinal),
            multi: self.multi.get(ordinal),
            string: self.string.get(ordinal),
        })
    }
}

/// One loaded document: its values in each column
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentRef<'a> {
    pub ordinal: DocOrdinal,
    pub uint: &'a [u32],
    pub float: &'a [f32],
    pub multi: &'a [u32],
    pub string: &'a [String],
}

impl DocumentRef<'_> {
    /// Stringified value at an offset of one column.
    ///
    /// Multi records yield only the scalar at the offset.
    pub fn value_string(&self, kind: AttrKind, offset: usize) -> Option<String> {
        match kind {
            AttrKind::Uint => self.uint.get(offset).map(u32::to_string),
            AttrKind::Float => self.float.get(offset).map(|v| format_float(*v)),
            AttrKind::Multi => self.multi.get(offset).map(u32::to_string),
            AttrKind::String => self.string.get(offset).cloned(),
        }
    }
}

/// Fixed-precision float rendering shared by filters and formatters
pub fn format_float(value: f32) -> String {
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> AttributeStore {
        let schema = SourceSchema::new()
            .with_uint("id")
            .with_uint("year")
            .with_float("price")
            .with_multi("tags")
            .with_string("title")
            .with_string("year");

        let mut store = AttributeStore::from_schema(&schema);
        store.push_document(AttrRecord {
            uint: vec![1, 1999],
            float: vec![9.5],
            multi: vec![3, 4],
            string: vec!["Dune".into(), "old".into()],
        });
        store.push_document(AttrRecord {
            uint: vec![2, 2021],
            float: vec![12.0],
            multi: vec![],
            string: vec!["Hyperion".into(), "new".into()],
        });
        store
    }

    #[test]
    fn test_columns_follow_ordinals() {
        let store = sample_store();
        assert_eq!(store.validate().unwrap(), 2);
        assert_eq!(store.uint.get(DocOrdinal(1)), &[2, 2021]);
        assert!(store.multi.get(DocOrdinal(1)).is_empty());
        assert!(store.uint.get(DocOrdinal(9)).is_empty());
    }

    #[test]
    fn test_resolve_prefers_earlier_kind() {
        let store = sample_store();
        assert_eq!(store.resolve("id"), Some((AttrKind::Uint, 0)));
        assert_eq!(store.resolve("price"), Some((AttrKind::Float, 0)));
        assert_eq!(store.resolve("tags"), Some((AttrKind::Multi, 0)));
        assert_eq!(store.resolve("title"), Some((AttrKind::String, 0)));
        // "year" is both unsigned and string: unsigned wins
        assert_eq!(store.resolve("year"), Some((AttrKind::Uint, 1)));
        assert_eq!(store.resolve("missing"), None);
    }

    #[test]
    fn test_value_string() {
        let store = sample_store();
        let doc = store.document(DocOrdinal(0)).unwrap();

        assert_eq!(doc.value_string(AttrKind::Uint, 1), Some("1999".to_string()));
        assert_eq!(doc.value_string(AttrKind::Float, 0), Some("9.500000".to_string()));
        assert_eq!(doc.value_string(AttrKind::Multi, 1), Some("4".to_string()));
        assert_eq!(doc.value_string(AttrKind::String, 0), Some("Dune".to_string()));
        assert_eq!(doc.value_string(AttrKind::Float, 3), None);

        assert!(store.document(DocOrdinal(2)).is_none());
    }

    #[test]
    fn test_validate_detects_mismatch() {
        let mut store = sample_store();
        store.float.push(vec![1.0]);

        let err = store.validate().unwrap_err();
        assert!(matches!(
            err,
            SieveError::DocCountMismatch {
                kind: AttrKind::Float,
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AttrKind::Uint.to_string(), "unsigned");
        assert_eq!(AttrKind::Multi.file_extension(), "lcm");
    }
}
