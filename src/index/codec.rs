//! On-disk layout of the index file and the attribute files
//!
//! Index file, one record per term:
//! - `[fingerprint:8][text_len:4][text:text_len][posting_count:4]`
//! - then per posting `[ordinal:4][payload_size:1][payload:payload_size]`
//!
//! Attribute file, one per column kind:
//! - `[doc_count:4][name_count:1][name_lens:name_count*4][names + NUL each]`
//! - then per document `[count:1][values:count*4]`, or for strings
//!   `[count:1][lens:count*4][bytes + NUL each]`
//!
//! Integers and floats are little-endian. Readers never trust a declared
//! length without checking the bytes remaining.

use std::io;
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};

use super::attributes::{AttrCatalogue, AttrColumn, AttrKind, AttributeStore};
use super::types::{DocOrdinal, Posting, PostingIndex, Term};
use crate::config::IndexSettings;
use crate::error::{Result, SieveError};

/// Cursor over file bytes that reports truncation instead of panicking
pub struct ByteReader<'a> {
    data: &'a [u8],
    total: usize,
    path: &'a Path,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], path: &'a Path) -> Self {
        Self {
            data,
            total: data.len(),
            path,
        }
    }

    pub fn offset(&self) -> usize {
        self.total - self.data.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.data.remaining() < needed {
            return Err(SieveError::Truncated {
                path: self.path.to_path_buf(),
                offset: self.offset(),
                needed,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data.get_u8())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.data.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.data.get_u64_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.data.get_f32_le())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    /// Own a stored string, rejecting invalid UTF-8
    pub fn utf8(&self, bytes: &[u8]) -> Result<String> {
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| {
            SieveError::CorruptRecord(format!(
                "invalid UTF-8 in {} before offset {}: {}",
                self.path.display(),
                self.offset(),
                e
            ))
        })
    }
}

/// Clamp an element count to one byte, warning when values are lost
fn byte_count(len: usize, what: &str) -> usize {
    if len > u8::MAX as usize {
        tracing::warn!("{} has {} elements, keeping {}", what, len, u8::MAX);
        u8::MAX as usize
    } else {
        len
    }
}

/// Element type of an attribute column
pub trait AttrElement: Sized {
    fn encode_record(values: &[Self], out: &mut BytesMut);

    fn decode_record(reader: &mut ByteReader<'_>) -> Result<Vec<Self>>;
}

impl AttrElement for u32 {
    fn encode_record(values: &[Self], out: &mut BytesMut) {
        let count = byte_count(values.len(), "unsigned record");
        out.put_u8(count as u8);
        for v in &values[..count] {
            out.put_u32_le(*v);
        }
    }

    fn decode_record(reader: &mut ByteReader<'_>) -> Result<Vec<Self>> {
        let count = reader.read_u8()? as usize;
        (0..count).map(|_| reader.read_u32()).collect()
    }
}

impl AttrElement for f32 {
    fn encode_record(values: &[Self], out: &mut BytesMut) {
        let count = byte_count(values.len(), "float record");
        out.put_u8(count as u8);
        for v in &values[..count] {
            out.put_f32_le(*v);
        }
    }

    fn decode_record(reader: &mut ByteReader<'_>) -> Result<Vec<Self>> {
        let count = reader.read_u8()? as usize;
        (0..count).map(|_| reader.read_f32()).collect()
    }
}

impl AttrElement for String {
    fn encode_record(values: &[Self], out: &mut BytesMut) {
        let count = byte_count(values.len(), "string record");
        out.put_u8(count as u8);
        for v in &values[..count] {
            out.put_u32_le(v.len() as u32);
        }
        for v in &values[..count] {
            out.put_slice(v.as_bytes());
            out.put_u8(0);
        }
    }

    fn decode_record(reader: &mut ByteReader<'_>) -> Result<Vec<Self>> {
        let count = reader.read_u8()? as usize;
        let lens = (0..count)
            .map(|_| reader.read_u32().map(|l| l as usize))
            .collect::<Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(count);
        for len in lens {
            let bytes = reader.read_bytes(len)?;
            let at = reader.offset();
            if reader.read_u8()? != 0 {
                return Err(SieveError::CorruptRecord(format!(
                    "string value in {} lacks NUL terminator at offset {}",
                    reader.path.display(),
                    at
                )));
            }
            values.push(reader.utf8(bytes)?);
        }
        Ok(values)
    }
}

/// Serialize a posting index.
///
/// With `sort_terms` the records are ordered by term so the output is
/// byte-for-byte reproducible; otherwise hash order is used.
pub fn encode_index(index: &PostingIndex, sort_terms: bool) -> BytesMut {
    let mut terms: Vec<&Term> = index.keys().collect();
    if sort_terms {
        terms.sort();
    }

    let mut out = BytesMut::new();
    for term in terms {
        let postings = index.items(term);

        out.put_u64_le(term.fingerprint());
        out.put_u32_le(term.text().len() as u32);
        out.put_slice(term.text().as_bytes());
        out.put_u32_le(postings.len() as u32);

        for posting in postings {
            out.put_u32_le(posting.ordinal().as_u32());
            out.put_u8(posting.hit_payload_size());
            out.put_slice(posting.payload());
        }
    }
    out
}

/// Parse a posting index from file bytes
pub fn decode_index(data: &[u8], path: &Path) -> Result<PostingIndex> {
    let mut reader = ByteReader::new(data, path);
    let mut index = PostingIndex::new();

    while !reader.is_empty() {
        let fingerprint = reader.read_u64()?;
        let text_len = reader.read_u32()? as usize;
        let text = reader.read_bytes(text_len)?;
        let text = reader.utf8(text)?;
        let term = Term::from_parts(fingerprint, text);

        let count = reader.read_u32()? as usize;
        let mut postings = Vec::with_capacity(count.min(reader.data.remaining() / 5));
        for _ in 0..count {
            let ordinal = DocOrdinal(reader.read_u32()?);
            let size = reader.read_u8()? as usize;
            let payload = reader.read_bytes(size)?.to_vec();
            let posting = Posting::from_payload(ordinal, payload).map_err(|e| {
                SieveError::CorruptRecord(format!("term '{}' in {}: {}", term, path.display(), e))
            })?;
            postings.push(posting);
        }
        index.add_all(term, postings);
    }

    Ok(index)
}

/// Serialize one attribute column with its catalogue
pub fn encode_attributes<T: AttrElement>(
    column: &AttrColumn<T>,
    catalogue: &AttrCatalogue,
) -> BytesMut {
    let mut out = BytesMut::new();
    out.put_u32_le(column.len() as u32);
    String::encode_record(catalogue.names(), &mut out);
    for record in column.records() {
        T::encode_record(record, &mut out);
    }
    out
}

/// Parse one attribute file into its column and catalogue
pub fn decode_attributes<T: AttrElement>(
    data: &[u8],
    path: &Path,
) -> Result<(AttrColumn<T>, AttrCatalogue)> {
    let mut reader = ByteReader::new(data, path);
    let doc_count = reader.read_u32()? as usize;
    let catalogue = AttrCatalogue::new(String::decode_record(&mut reader)?);

    let mut column = AttrColumn::with_capacity(doc_count.min(data.len()));
    for _ in 0..doc_count {
        column.push(T::decode_record(&mut reader)?);
    }
    Ok((column, catalogue))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SieveError::MissingFile(path.to_path_buf()),
        _ => SieveError::Io(e),
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Write the posting index to its file
pub fn write_index(path: &Path, index: &PostingIndex, sort_terms: bool) -> Result<()> {
    write_file(path, &encode_index(index, sort_terms))
}

/// Load the posting index from its file
pub fn read_index(path: &Path) -> Result<PostingIndex> {
    let data = read_file(path)?;
    decode_index(&data, path)
}

/// Write one attribute column to its file
pub fn write_attributes<T: AttrElement>(
    path: &Path,
    column: &AttrColumn<T>,
    catalogue: &AttrCatalogue,
) -> Result<()> {
    write_file(path, &encode_attributes(column, catalogue))
}

/// Write all four attribute files
pub fn write_attribute_store(settings: &IndexSettings, store: &AttributeStore) -> Result<()> {
    write_attributes(
        &settings.attr_file(AttrKind::Uint),
        &store.uint,
        store.catalogue(AttrKind::Uint),
    )?;
    write_attributes(
        &settings.attr_file(AttrKind::Float),
        &store.float,
        store.catalogue(AttrKind::Float),
    )?;
    write_attributes(
        &settings.attr_file(AttrKind::Multi),
        &store.multi,
        store.catalogue(AttrKind::Multi),
    )?;
    write_attributes(
        &settings.attr_file(AttrKind::String),
        &store.string,
        store.catalogue(AttrKind::String),
    )
}

fn read_column<T: AttrElement>(
    settings: &IndexSettings,
    kind: AttrKind,
    expected: Option<usize>,
) -> Result<(AttrColumn<T>, AttrCatalogue)> {
    let path = settings.attr_file(kind);
    let data = read_file(&path)?;
    let (column, catalogue) = decode_attributes::<T>(&data, &path)?;

    if let Some(expected) = expected {
        if column.len() != expected {
            return Err(SieveError::DocCountMismatch {
                kind,
                expected,
                actual: column.len(),
            });
        }
    }
    Ok((column, catalogue))
}

/// Load all four attribute files, requiring equal document counts
pub fn read_attributes(settings: &IndexSettings) -> Result<AttributeStore> {
    let (uint, uint_names) = read_column::<u32>(settings, AttrKind::Uint, None)?;
    let doc_count = Some(uint.len());
    let (float, float_names) = read_column::<f32>(settings, AttrKind::Float, doc_count)?;
    let (multi, multi_names) = read_column::<u32>(settings, AttrKind::Multi, doc_count)?;
    let (string, string_names) = read_column::<String>(settings, AttrKind::String, doc_count)?;

    let mut store = AttributeStore::default();
    store.uint = uint;
    store.float = float;
    store.multi = multi;
    store.string = string;
    store.set_catalogue(AttrKind::Uint, uint_names);
    store.set_catalogue(AttrKind::Float, float_names);
    store.set_catalogue(AttrKind::Multi, multi_names);
    store.set_catalogue(AttrKind::String, string_names);
    Ok(store)
}
