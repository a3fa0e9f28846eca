//! Row sources feeding the index builder
//!
//! The relational connector lives outside this crate. Anything that can
//! hand out rows of `(column, raw value)` pairs implements [`RowSource`].

mod jsonl;

pub use jsonl::JsonLinesSource;

use std::collections::VecDeque;

use crate::Result;

/// One raw column value of a source row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceField {
    pub name: String,
    pub value: String,
}

/// One row pulled from the source, columns in source order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<SourceField>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column to the row
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(SourceField {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn fields(&self) -> &[SourceField] {
        &self.fields
    }

    /// Raw value of the first column with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A stream of rows, read once from start to end
pub trait RowSource {
    /// Next row, or `None` when the source is exhausted
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Rows held in memory
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    rows: VecDeque<Row>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }
}

impl RowSource for MemorySource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<Row>> {
        (**self).next_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = Row::new().with("id", "1").with("title", "Dune").with("id", "2");
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("title"), Some("Dune"));
        assert_eq!(row.get("body"), None);
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["id", "title", "id"]);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_memory_source_drains_in_order() {
        let mut source = MemorySource::new(vec![
            Row::new().with("n", "a"),
            Row::new().with("n", "b"),
        ]);
        assert_eq!(source.next_row().unwrap().unwrap().get("n"), Some("a"));
        assert_eq!(source.next_row().unwrap().unwrap().get("n"), Some("b"));
        assert!(source.next_row().unwrap().is_none());
    }
}
