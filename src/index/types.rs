//! Core types for the inverted index

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::fingerprint::fingerprint;
use super::inverter::Inverter;

/// Dense document number within one index build (0..doc_count)
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocOrdinal(pub u32);

impl DocOrdinal {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The following ordinal, or `None` at the end of the range
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for DocOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a text field in the configured field list
pub type FieldId = u8;

/// Largest hit payload a posting can declare
pub const MAX_HIT_PAYLOAD: usize = u8::MAX as usize;

/// Largest position count a field hit can declare
pub const MAX_FIELD_POSITIONS: usize = u8::MAX as usize;

/// Size of a field hit header: field id + position count
const FIELD_HIT_HEADER: usize = 2;

/// A token's identity: its fingerprint plus the original text.
///
/// Equality checks the fingerprint first and falls back to the text to
/// guard against collisions. Hashing uses the fingerprint only.
#[derive(Clone, Debug, Eq)]
pub struct Term {
    fingerprint: u64,
    text: String,
}

impl Term {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            fingerprint: fingerprint(text.as_bytes()),
            text,
        }
    }

    /// Rebuild a term from a stored fingerprint without rehashing
    pub fn from_parts(fingerprint: u64, text: String) -> Self {
        Self { fingerprint, text }
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && self.text == other.text
    }
}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fingerprint
            .cmp(&other.fingerprint)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Occurrences of one term inside one field of one document.
///
/// Positions are single bytes: word positions past 255 wrap, and at most
/// 255 positions are kept per field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldHit {
    pub field: FieldId,
    pub positions: Vec<u8>,
}

impl FieldHit {
    pub fn new(field: FieldId, positions: Vec<u8>) -> Self {
        Self { field, positions }
    }
}

/// Borrowed view of one field hit inside a posting payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHitRef<'a> {
    pub field: FieldId,
    pub positions: &'a [u8],
}

impl FieldHitRef<'_> {
    pub fn to_hit(&self) -> FieldHit {
        FieldHit::new(self.field, self.positions.to_vec())
    }
}

/// One document's occurrence record for one term.
///
/// The payload holds packed field hits: `[field:1][count:1][positions:count]`
/// repeated. It never exceeds [`MAX_HIT_PAYLOAD`] bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
    ordinal: DocOrdinal,
    payload: Vec<u8>,
}

impl Posting {
    /// Pack field hits into a posting.
    ///
    /// Positions that do not fit the one-byte count or the one-byte payload
    /// size are dropped; a field is dropped when no position fits.
    pub fn pack<'a, I>(ordinal: DocOrdinal, hits: I) -> Self
    where
        I: IntoIterator<Item = (FieldId, &'a [u8])>,
    {
        let mut payload = Vec::new();

        for (field, positions) in hits {
            let room = MAX_HIT_PAYLOAD - payload.len();
            if room <= FIELD_HIT_HEADER || positions.is_empty() {
                if !positions.is_empty() {
                    tracing::warn!(
                        "hit payload full for doc {}, dropping field {}",
                        ordinal,
                        field
                    );
                }
                continue;
            }

            let count = positions
                .len()
                .min(MAX_FIELD_POSITIONS)
                .min(room - FIELD_HIT_HEADER);
            if count < positions.len() {
                tracing::warn!(
                    "truncating field {} of doc {} from {} to {} positions",
                    field,
                    ordinal,
                    positions.len(),
                    count
                );
            }

            payload.push(field);
            payload.push(count as u8);
            payload.extend_from_slice(&positions[..count]);
        }

        Self { ordinal, payload }
    }

    /// Wrap a stored payload, checking that its field hits stay in bounds
    pub fn from_payload(ordinal: DocOrdinal, payload: Vec<u8>) -> Result<Self, String> {
        if payload.len() > MAX_HIT_PAYLOAD {
            return Err(format!(
                "hit payload of {} bytes for doc {} exceeds {}",
                payload.len(),
                ordinal,
                MAX_HIT_PAYLOAD
            ));
        }

        let mut pos = 0;
        while pos < payload.len() {
            if pos + FIELD_HIT_HEADER > payload.len() {
                return Err(format!("field hit header cut short in doc {}", ordinal));
            }
            let count = payload[pos + 1] as usize;
            pos += FIELD_HIT_HEADER + count;
            if pos > payload.len() {
                return Err(format!(
                    "field hit declares {} positions past payload end in doc {}",
                    count, ordinal
                ));
            }
        }

        Ok(Self { ordinal, payload })
    }

    pub fn ordinal(&self) -> DocOrdinal {
        self.ordinal
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared size of the hit payload
    pub fn hit_payload_size(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Iterate over the packed field hits
    pub fn field_hits(&self) -> FieldHits<'_> {
        FieldHits {
            payload: &self.payload,
            pos: 0,
        }
    }

    /// Owned copy of every field hit
    pub fn hits(&self) -> Vec<FieldHit> {
        self.field_hits().map(|h| h.to_hit()).collect()
    }

    /// Total number of recorded occurrences across all fields
    pub fn occurrence_count(&self) -> usize {
        self.field_hits().map(|h| h.positions.len()).sum()
    }
}

/// Iterator over the field hits of a posting payload.
///
/// Stops at the first record that would read past the payload end.
pub struct FieldHits<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for FieldHits<'a> {
    type Item = FieldHitRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.payload.get(self.pos..self.pos + FIELD_HIT_HEADER)?;
        let (field, count) = (header[0], header[1] as usize);
        let start = self.pos + FIELD_HIT_HEADER;
        let positions = self.payload.get(start..start + count)?;
        self.pos = start + count;
        Some(FieldHitRef { field, positions })
    }
}

/// All postings for one term, in ascending ordinal order
pub type PostingList = Vec<Posting>;

/// Global inverted index: term to posting list
pub type PostingIndex = Inverter<Term, Posting>;
