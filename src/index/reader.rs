use tracing::{error, info};

use super::attributes::{AttributeStore, DocumentRef};
use super::builder::BuiltIndex;
use super::codec;
use super::types::{DocOrdinal, Posting, PostingIndex, Term};
use crate::config::IndexSettings;
use crate::error::{Result, SieveError};

/// Read-only index held in memory for query serving.
///
/// Every posting list is in ascending ordinal order and every ordinal has
/// a row in each attribute column.
#[derive(Clone, Debug, Default)]
pub struct LoadedIndex {
    postings: PostingIndex,
    attributes: AttributeStore,
}

impl LoadedIndex {
    /// Load the index file and the four attribute files
    pub fn open(settings: &IndexSettings) -> Result<Self> {
        let loaded = codec::read_index(&settings.index_file()).and_then(|postings| {
            let attributes = codec::read_attributes(settings)?;
            Self::from_parts(postings, attributes)
        });

        match &loaded {
            Ok(index) => info!(
                "loaded index '{}': {} documents, {} terms",
                settings.name,
                index.doc_count(),
                index.term_count()
            ),
            Err(e) => error!("index '{}' is unusable: {}", settings.name, e),
        }
        loaded
    }

    /// Assemble an index, checking posting order and ordinal range
    pub fn from_parts(postings: PostingIndex, attributes: AttributeStore) -> Result<Self> {
        let doc_count = attributes.validate()?;

        for (term, list) in postings.iter() {
            let mut previous: Option<DocOrdinal> = None;
            for posting in list {
                let ordinal = posting.ordinal();
                if ordinal.as_usize() >= doc_count {
                    return Err(SieveError::CorruptRecord(format!(
                        "term '{}' references doc {} of {}",
                        term, ordinal, doc_count
                    )));
                }
                if previous.is_some_and(|p| p > ordinal) {
                    return Err(SieveError::CorruptRecord(format!(
                        "postings of term '{}' go backwards at doc {}",
                        term, ordinal
                    )));
                }
                previous = Some(ordinal);
            }
        }

        Ok(Self {
            postings,
            attributes,
        })
    }

    /// Posting list of a term, empty when the term is unknown
    pub fn postings(&self, term: &Term) -> &[Posting] {
        self.postings.items(term)
    }

    pub fn postings_for(&self, text: &str) -> &[Posting] {
        self.postings(&Term::new(text))
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn document(&self, ordinal: DocOrdinal) -> Option<DocumentRef<'_>> {
        self.attributes.document(ordinal)
    }

    pub fn doc_count(&self) -> usize {
        self.attributes.doc_count()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}

impl TryFrom<BuiltIndex> for LoadedIndex {
    type Error = SieveError;

    fn try_from(built: BuiltIndex) -> Result<Self> {
        Self::from_parts(built.postings, built.attributes)
    }
}
