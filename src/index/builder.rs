//! Turns source rows into postings and attribute records

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::attributes::{AttrRecord, AttributeStore};
use super::codec;
use super::inverter::Inverter;
use super::types::{DocOrdinal, FieldId, Posting, PostingIndex, Term};
use crate::config::{IndexSettings, SourceSchema};
use crate::error::{Result, SieveError};
use crate::source::{Row, RowSource};
use crate::tokenizer::Segmenter;

/// Rows between progress log lines
const PROGRESS_INTERVAL: usize = 1000;

/// Builds an index from rows, one document per row.
///
/// Ordinals are assigned 0, 1, 2... in row order. Configured columns are
/// checked against the first row; later rows missing a column get the
/// kind's default value.
pub struct IndexBuilder<'s, S: Segmenter + ?Sized> {
    schema: SourceSchema,
    segmenter: &'s S,
    postings: PostingIndex,
    attributes: AttributeStore,
    columns_checked: bool,
    started: Instant,
}

impl<'s, S: Segmenter + ?Sized> IndexBuilder<'s, S> {
    pub fn new(schema: SourceSchema, segmenter: &'s S) -> Self {
        if schema.text_fields.len() > usize::from(FieldId::MAX) + 1 {
            warn!(
                "{} text fields configured, only the first {} are indexed",
                schema.text_fields.len(),
                usize::from(FieldId::MAX) + 1
            );
        }
        let attributes = AttributeStore::from_schema(&schema);
        Self {
            schema,
            segmenter,
            postings: PostingIndex::new(),
            attributes,
            columns_checked: false,
            started: Instant::now(),
        }
    }

    /// Check that every configured column appears in the source columns
    pub fn check_columns<'a, I>(&self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: Vec<&str> = columns.into_iter().collect();
        for column in self.schema.all_columns() {
            if !present.contains(&column.as_str()) {
                error!("configured column '{}' is not in the source", column);
                return Err(SieveError::UnknownColumn {
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    /// Index one row as the next document
    pub fn add_row(&mut self, row: &Row) -> Result<DocOrdinal> {
        if !self.columns_checked {
            self.check_columns(row.column_names())?;
            self.columns_checked = true;
        }

        let ordinal = next_ordinal(self.attributes.doc_count())?;
        let record = self.parse_attributes(row, ordinal);
        self.invert_text(row, ordinal);
        self.attributes.push_document(record);

        let indexed = self.attributes.doc_count();
        if indexed % PROGRESS_INTERVAL == 0 {
            info!(
                "indexed {} documents, {} terms, {:?} elapsed",
                indexed,
                self.postings.len(),
                self.started.elapsed()
            );
        }
        Ok(ordinal)
    }

    /// Drain a row source into the index
    pub fn add_source<R: RowSource + ?Sized>(&mut self, source: &mut R) -> Result<usize> {
        let mut rows = 0;
        while let Some(row) = source.next_row()? {
            self.add_row(&row)?;
            rows += 1;
        }
        Ok(rows)
    }

    pub fn doc_count(&self) -> usize {
        self.attributes.doc_count()
    }

    pub fn finish(self) -> BuiltIndex {
        info!(
            "index built: {} documents, {} terms, {} postings in {:?}",
            self.attributes.doc_count(),
            self.postings.len(),
            self.postings.item_count(),
            self.started.elapsed()
        );
        BuiltIndex {
            postings: self.postings,
            attributes: self.attributes,
        }
    }

    fn parse_attributes(&self, row: &Row, ordinal: DocOrdinal) -> AttrRecord {
        let value = |name: &str| row.get(name).unwrap_or("");

        AttrRecord {
            uint: self
                .schema
                .attr_uint
                .iter()
                .map(|name| parse_uint(value(name), name, ordinal))
                .collect(),
            float: self
                .schema
                .attr_float
                .iter()
                .map(|name| parse_float(value(name), name, ordinal))
                .collect(),
            multi: self
                .schema
                .attr_multi
                .iter()
                .flat_map(|name| {
                    value(name)
                        .split(',')
                        .map(str::trim)
                        .filter(|piece| !piece.is_empty())
                        .map(move |piece| parse_uint(piece, name, ordinal))
                })
                .collect(),
            string: self
                .schema
                .attr_string
                .iter()
                .map(|name| value(name).to_string())
                .collect(),
        }
    }

    fn invert_text(&mut self, row: &Row, ordinal: DocOrdinal) {
        // Term -> field id -> positions, ordered so postings land deterministically
        let mut doc_hits: BTreeMap<Term, Inverter<FieldId, u8>> = BTreeMap::new();

        for (index, name) in self.schema.text_fields.iter().enumerate() {
            let Ok(field) = FieldId::try_from(index) else {
                break;
            };
            let Some(text) = row.get(name) else {
                continue;
            };

            let tokens = match self.segmenter.segment(text) {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!("cannot segment field '{}' of doc {}: {}", name, ordinal, e);
                    continue;
                }
            };

            for token in tokens {
                doc_hits
                    .entry(Term::new(token.text))
                    .or_default()
                    .add(field, token.position as u8);
            }
        }

        for (term, fields) in doc_hits {
            let mut ids: Vec<FieldId> = fields.keys().copied().collect();
            ids.sort_unstable();
            let posting = Posting::pack(ordinal, ids.iter().map(|id| (*id, fields.items(id))));
            self.postings.add(term, posting);
        }
    }
}

/// Ordinal for the document after `count` indexed ones
fn next_ordinal(count: usize) -> Result<DocOrdinal> {
    u32::try_from(count).map(DocOrdinal).map_err(|_| {
        error!("document {} does not fit a 32-bit ordinal", count);
        SieveError::TooManyDocuments { count }
    })
}

/// Length of the leading `[+]digits` run, 0 when there is none
fn uint_prefix_len(s: &str) -> usize {
    let sign = usize::from(s.starts_with('+'));
    match s[sign..].bytes().take_while(u8::is_ascii_digit).count() {
        0 => 0,
        digits => sign + digits,
    }
}

/// Length of the leading `[+-]digits[.digits][e[+-]digits]` run, 0 when
/// there is none
fn float_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits = |from: usize| {
        b.get(from..)
            .map_or(0, |tail| tail.iter().take_while(|c| c.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int = digits(end);
    end += int;
    let mut frac = 0;
    if b.get(end) == Some(&b'.') {
        frac = digits(end + 1);
        if int + frac > 0 {
            end += 1 + frac;
        }
    }
    if int + frac == 0 {
        return 0;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let n = digits(exp);
        if n > 0 {
            end = exp + n;
        }
    }
    end
}

/// Unsigned value of the leading digits; text after them is ignored and
/// values without leading digits become 0
fn parse_uint(raw: &str, column: &str, ordinal: DocOrdinal) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    let len = uint_prefix_len(raw);
    if len == 0 {
        warn!("doc {}: '{}' is not unsigned in column '{}', using 0", ordinal, raw, column);
        return 0;
    }
    if len < raw.len() {
        debug!("doc {}: ignoring '{}' after number in column '{}'", ordinal, &raw[len..], column);
    }
    raw[..len].parse().unwrap_or_else(|_| {
        warn!("doc {}: '{}' overflows column '{}', using {}", ordinal, raw, column, u32::MAX);
        u32::MAX
    })
}

/// Float value of the leading decimal number, 0 when there is none
fn parse_float(raw: &str, column: &str, ordinal: DocOrdinal) -> f32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    let len = float_prefix_len(raw);
    if len == 0 {
        warn!("doc {}: '{}' is not a float in column '{}', using 0", ordinal, raw, column);
        return 0.0;
    }
    if len < raw.len() {
        debug!("doc {}: ignoring '{}' after number in column '{}'", ordinal, &raw[len..], column);
    }
    raw[..len].parse().unwrap_or(0.0)
}

/// A finished in-memory index
#[derive(Clone, Debug, Default)]
pub struct BuiltIndex {
    pub postings: PostingIndex,
    pub attributes: AttributeStore,
}

impl BuiltIndex {
    pub fn doc_count(&self) -> usize {
        self.attributes.doc_count()
    }

    /// Write the index file and the four attribute files
    pub fn write(&self, settings: &IndexSettings, sort_terms: bool) -> Result<()> {
        let result = codec::write_index(&settings.index_file(), &self.postings, sort_terms)
            .and_then(|_| codec::write_attribute_store(settings, &self.attributes));
        match &result {
            Ok(()) => info!(
                "wrote index '{}' to {}",
                settings.name,
                settings.index_path.display()
            ),
            Err(e) => error!("failed to write index '{}': {}", settings.name, e),
        }
        result
    }
}

/// Build an index from a row source in one pass
pub fn build_index<R, S>(schema: SourceSchema, segmenter: &S, source: &mut R) -> Result<BuiltIndex>
where
    R: RowSource + ?Sized,
    S: Segmenter + ?Sized,
{
    let mut builder = IndexBuilder::new(schema, segmenter);
    builder.add_source(source)?;
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AttrKind, FieldHit};
    use crate::source::MemorySource;
    use crate::tokenizer::SegmentToken;

    /// Splits on whitespace, keeps every word
    struct Whitespace;

    impl Segmenter for Whitespace {
        fn segment(&self, text: &str) -> Result<Vec<SegmentToken>> {
            Ok(text
                .split_whitespace()
                .enumerate()
                .map(|(i, w)| SegmentToken::new(w, i as u32))
                .collect())
        }
    }

    struct Failing;

    impl Segmenter for Failing {
        fn segment(&self, _text: &str) -> Result<Vec<SegmentToken>> {
            Err(SieveError::Tokenizer("boom".into()))
        }
    }

    fn schema() -> SourceSchema {
        SourceSchema::new()
            .with_uint("id")
            .with_float("price")
            .with_multi("tags")
            .with_string("category")
            .with_text_field("title")
            .with_text_field("body")
    }

    fn row(id: &str, price: &str, tags: &str, category: &str, title: &str, body: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("price", price)
            .with("tags", tags)
            .with("category", category)
            .with("title", title)
            .with("body", body)
    }

    #[test]
    fn test_assigns_ordinals_and_attributes() {
        let mut source = MemorySource::new(vec![
            row("10", "1.5", "1, 2,,3", "news", "cat", ""),
            row("x", "", "", "", "dog", "cat"),
        ]);
        let built = build_index(schema(), &Whitespace, &mut source).unwrap();

        assert_eq!(built.doc_count(), 2);
        let attrs = &built.attributes;
        assert_eq!(attrs.uint.get(DocOrdinal(0)), &[10]);
        assert_eq!(attrs.uint.get(DocOrdinal(1)), &[0]);
        assert_eq!(attrs.float.get(DocOrdinal(0)), &[1.5]);
        assert_eq!(attrs.float.get(DocOrdinal(1)), &[0.0]);
        assert_eq!(attrs.multi.get(DocOrdinal(0)), &[1, 2, 3]);
        assert!(attrs.multi.get(DocOrdinal(1)).is_empty());
        assert_eq!(attrs.string.get(DocOrdinal(0)), &["news".to_string()]);
        assert_eq!(attrs.catalogue(AttrKind::String).names(), &["category".to_string()]);
    }

    #[test]
    fn test_numbers_use_leading_prefix() {
        let mut source = MemorySource::new(vec![
            row("1999abc", "1.5kg", "4 items, 7", "", "a", ""),
            row("9.99", "-2.5e1x", "+3,x", "", "b", ""),
            row(" 12 ", ".5", "", "", "c", ""),
            row("-4", "e5", "", "", "d", ""),
            row("99999999999", "3.", "", "", "e", ""),
        ]);
        let built = build_index(schema(), &Whitespace, &mut source).unwrap();
        let attrs = &built.attributes;

        let uints: Vec<u32> = (0..5).map(|n| attrs.uint.get(DocOrdinal(n))[0]).collect();
        assert_eq!(uints, vec![1999, 9, 12, 0, u32::MAX]);

        let floats: Vec<f32> = (0..5).map(|n| attrs.float.get(DocOrdinal(n))[0]).collect();
        assert_eq!(floats, vec![1.5, -25.0, 0.5, 0.0, 3.0]);

        assert_eq!(attrs.multi.get(DocOrdinal(0)), &[4, 7]);
        assert_eq!(attrs.multi.get(DocOrdinal(1)), &[3, 0]);
    }

    #[test]
    fn test_prefix_lengths() {
        assert_eq!(uint_prefix_len("12ab"), 2);
        assert_eq!(uint_prefix_len("+7"), 2);
        assert_eq!(uint_prefix_len("+"), 0);
        assert_eq!(uint_prefix_len("-3"), 0);

        assert_eq!(float_prefix_len("1e"), 1);
        assert_eq!(float_prefix_len("1e+"), 1);
        assert_eq!(float_prefix_len("1E-3z"), 4);
        assert_eq!(float_prefix_len("-.25"), 4);
        assert_eq!(float_prefix_len("."), 0);
        assert_eq!(float_prefix_len("-"), 0);
    }

    #[test]
    fn test_ordinal_range() {
        assert_eq!(next_ordinal(0).unwrap(), DocOrdinal(0));
        assert_eq!(next_ordinal(u32::MAX as usize).unwrap(), DocOrdinal(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_ordinal_overflow_is_build_error() {
        let err = next_ordinal(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, SieveError::TooManyDocuments { .. }));
        assert!(err.is_build_error());
    }

    #[test]
    fn test_postings_carry_field_hits() {
        let mut source = MemorySource::new(vec![
            row("1", "0", "", "", "cat cat", "the cat"),
            row("2", "0", "", "", "dog", "cat"),
        ]);
        let built = build_index(schema(), &Whitespace, &mut source).unwrap();

        let cat = built.postings.items(&Term::new("cat"));
        assert_eq!(cat.len(), 2);
        assert_eq!(cat[0].ordinal(), DocOrdinal(0));
        assert_eq!(
            cat[0].hits(),
            vec![FieldHit::new(0, vec![0, 1]), FieldHit::new(1, vec![1])]
        );
        assert_eq!(cat[1].hits(), vec![FieldHit::new(1, vec![0])]);

        assert_eq!(built.postings.items(&Term::new("dog")).len(), 1);
        assert!(built.postings.items(&Term::new("bird")).is_empty());
    }

    #[test]
    fn test_missing_column_fails_build() {
        let mut source = MemorySource::new(vec![Row::new().with("id", "1").with("title", "x")]);
        let err = build_index(schema(), &Whitespace, &mut source).unwrap_err();
        assert!(matches!(err, SieveError::UnknownColumn { ref column } if column == "price"));
        assert!(err.is_build_error());
    }

    #[test]
    fn test_segment_failure_skips_field() {
        let mut source = MemorySource::new(vec![row("1", "0", "", "", "cat", "dog")]);
        let built = build_index(schema(), &Failing, &mut source).unwrap();
        assert_eq!(built.doc_count(), 1);
        assert!(built.postings.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let mut source = MemorySource::default();
        let built = build_index(schema(), &Whitespace, &mut source).unwrap();
        assert_eq!(built.doc_count(), 0);
        assert!(built.postings.is_empty());
    }
}
