//! Text segmentation capability
//!
//! The index builder and the searcher never split text themselves; they
//! consume a [`Segmenter`] that turns a string into ordered
//! `(token, position)` pairs. [`Tokenizer`] is the default implementation.

mod tokenizer;

pub use tokenizer::Tokenizer;

use crate::Result;

/// One token produced by a segmenter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentToken {
    pub text: String,
    /// Token position within the segmented text
    pub position: u32,
}

impl SegmentToken {
    pub fn new(text: impl Into<String>, position: u32) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// Turns text into an ordered sequence of tokens.
///
/// Implementations that keep mutable internal state must return `false`
/// from [`Segmenter::is_reentrant`]; callers then hold a lock across each
/// `segment` call and nothing else.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<SegmentToken>>;

    fn is_reentrant(&self) -> bool {
        true
    }
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn segment(&self, text: &str) -> Result<Vec<SegmentToken>> {
        (**self).segment(text)
    }

    fn is_reentrant(&self) -> bool {
        (**self).is_reentrant()
    }
}

impl<S: Segmenter + ?Sized> Segmenter for std::sync::Arc<S> {
    fn segment(&self, text: &str) -> Result<Vec<SegmentToken>> {
        (**self).segment(text)
    }

    fn is_reentrant(&self) -> bool {
        (**self).is_reentrant()
    }
}
