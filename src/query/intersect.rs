//! Multi-list posting intersection
//!
//! Each query term gets a [`PostingCursor`]. [`Intersection::seek`] runs the
//! restart scan: seek the first list, then every other list at the
//! candidate, and start over from the first list whenever a list answers
//! with a larger ordinal.

use crate::index::{DocOrdinal, LoadedIndex, Posting, Term};

/// Cursor over one ascending posting list
#[derive(Clone, Debug)]
pub struct PostingCursor<'a> {
    postings: &'a [Posting],
    pos: usize,
}

impl<'a> PostingCursor<'a> {
    pub fn new(postings: &'a [Posting]) -> Self {
        Self { postings, pos: 0 }
    }

    /// Posting under the cursor, `None` once the list is exhausted
    pub fn current(&self) -> Option<&'a Posting> {
        self.postings.get(self.pos)
    }

    /// Move to the first posting whose ordinal is at least `target`.
    ///
    /// Upward seeks search only the rest of the list; a target at or below
    /// the previous posting searches the whole list again.
    pub fn seek(&mut self, target: DocOrdinal) -> Option<DocOrdinal> {
        let behind = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.postings.get(i))
            .is_some_and(|p| p.ordinal() >= target);
        if behind {
            self.pos = 0;
        }
        let rest = &self.postings[self.pos..];
        self.pos += rest.partition_point(|p| p.ordinal() < target);
        self.current().map(Posting::ordinal)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Intersection of the posting lists of a fixed set of terms
#[derive(Clone, Debug)]
pub struct Intersection<'a> {
    cursors: Vec<PostingCursor<'a>>,
    next: Option<DocOrdinal>,
}

impl<'a> Intersection<'a> {
    pub fn new(lists: Vec<&'a [Posting]>) -> Self {
        let next = if lists.is_empty() {
            None
        } else {
            Some(DocOrdinal(0))
        };
        Self {
            cursors: lists.into_iter().map(PostingCursor::new).collect(),
            next,
        }
    }

    /// Intersect the posting lists of these terms, in query order
    pub fn for_terms(index: &'a LoadedIndex, terms: &[Term]) -> Self {
        Self::new(terms.iter().map(|t| index.postings(t)).collect())
    }

    /// Smallest ordinal at least `id` present in every list.
    ///
    /// Any `id` may be asked, in any order. `None` means no such ordinal,
    /// which is always the case with no terms.
    pub fn seek(&mut self, id: DocOrdinal) -> Option<DocOrdinal> {
        let (first, rest) = self.cursors.split_first_mut()?;
        let mut candidate = first.seek(id)?;

        'restart: loop {
            for cursor in rest.iter_mut() {
                let found = cursor.seek(candidate)?;
                if found != candidate {
                    candidate = first.seek(found)?;
                    continue 'restart;
                }
            }
            return Some(candidate);
        }
    }

    /// Postings of every term at the cursors' current position
    pub fn current_postings(&self) -> Vec<&'a Posting> {
        self.cursors.iter().filter_map(PostingCursor::current).collect()
    }
}

impl Iterator for Intersection<'_> {
    type Item = DocOrdinal;

    fn next(&mut self) -> Option<DocOrdinal> {
        let found = self.seek(self.next?);
        self.next = found.and_then(DocOrdinal::next);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ordinals: &[u32]) -> Vec<Posting> {
        ordinals
            .iter()
            .map(|&n| Posting::pack(DocOrdinal(n), vec![(0u8, &[0u8][..])]))
            .collect()
    }

    fn ordinals(iter: Intersection<'_>) -> Vec<u32> {
        iter.map(DocOrdinal::as_u32).collect()
    }

    #[test]
    fn test_cursor_seek() {
        let postings = list(&[1, 4, 9, 12]);
        let mut cursor = PostingCursor::new(&postings);

        assert_eq!(cursor.seek(DocOrdinal(0)), Some(DocOrdinal(1)));
        assert_eq!(cursor.seek(DocOrdinal(4)), Some(DocOrdinal(4)));
        assert_eq!(cursor.seek(DocOrdinal(5)), Some(DocOrdinal(9)));
        assert_eq!(cursor.seek(DocOrdinal(2)), Some(DocOrdinal(4)));
        assert_eq!(cursor.seek(DocOrdinal(4)), Some(DocOrdinal(4)));
        assert_eq!(cursor.seek(DocOrdinal(13)), None);
        assert_eq!(cursor.seek(DocOrdinal(0)), Some(DocOrdinal(1)));
        assert_eq!(cursor.seek(DocOrdinal(12)), Some(DocOrdinal(12)));
    }

    #[test]
    fn test_cursor_seek_over_repeated_ordinals() {
        let postings = list(&[2, 2, 5]);
        let mut cursor = PostingCursor::new(&postings);

        assert_eq!(cursor.seek(DocOrdinal(3)), Some(DocOrdinal(5)));
        assert_eq!(cursor.seek(DocOrdinal(2)), Some(DocOrdinal(2)));
        assert!(std::ptr::eq(cursor.current().unwrap(), &postings[0]));
    }

    #[test]
    fn test_intersection_seek_in_any_order() {
        let a = list(&[1, 4, 9]);
        let b = list(&[1, 9, 15]);
        let mut inter = Intersection::new(vec![&a[..], &b[..]]);

        assert_eq!(inter.seek(DocOrdinal(9)), Some(DocOrdinal(9)));
        assert_eq!(inter.seek(DocOrdinal(0)), Some(DocOrdinal(1)));
        assert_eq!(inter.seek(DocOrdinal(10)), None);
        assert_eq!(inter.seek(DocOrdinal(2)), Some(DocOrdinal(9)));
    }

    #[test]
    fn test_intersects_three_lists() {
        let a = list(&[1, 3, 5, 7, 9, 11]);
        let b = list(&[3, 4, 5, 9, 10, 11]);
        let c = list(&[0, 3, 9, 11, 20]);

        let inter = Intersection::new(vec![&a[..], &b[..], &c[..]]);
        assert_eq!(ordinals(inter), vec![3, 9, 11]);
    }

    #[test]
    fn test_single_list_yields_everything() {
        let a = list(&[0, 2, 4]);
        assert_eq!(ordinals(Intersection::new(vec![&a[..]])), vec![0, 2, 4]);
    }

    #[test]
    fn test_empty_list_terminates_immediately() {
        let a = list(&[1, 2, 3]);
        let empty = list(&[]);

        let mut inter = Intersection::new(vec![&a[..], &empty[..]]);
        assert_eq!(inter.seek(DocOrdinal(0)), None);

        let mut inter = Intersection::new(vec![&empty[..], &a[..]]);
        assert_eq!(inter.seek(DocOrdinal(0)), None);
    }

    #[test]
    fn test_no_terms_matches_nothing() {
        let mut inter = Intersection::new(Vec::new());
        assert_eq!(inter.seek(DocOrdinal(0)), None);
        assert_eq!(inter.next(), None);
    }

    #[test]
    fn test_disjoint_lists() {
        let a = list(&[0, 2, 4, 6]);
        let b = list(&[1, 3, 5, 7]);
        assert!(ordinals(Intersection::new(vec![&a[..], &b[..]])).is_empty());
    }

    #[test]
    fn test_same_list_twice() {
        let a = list(&[2, 8]);
        assert_eq!(ordinals(Intersection::new(vec![&a[..], &a[..]])), vec![2, 8]);
    }

    #[test]
    fn test_matches_brute_force() {
        let a: Vec<u32> = (0..200).filter(|n| n % 3 == 0).collect();
        let b: Vec<u32> = (0..200).filter(|n| n % 5 == 0).collect();
        let c: Vec<u32> = (0..200).filter(|n| n % 2 == 0).collect();
        let expected: Vec<u32> = (0..200).filter(|n| n % 30 == 0).collect();

        let (la, lb, lc) = (list(&a), list(&b), list(&c));
        assert_eq!(ordinals(Intersection::new(vec![&la[..], &lb[..], &lc[..]])), expected);
    }

    #[test]
    fn test_ends_at_max_ordinal() {
        let a = list(&[u32::MAX]);
        assert_eq!(ordinals(Intersection::new(vec![&a[..]])), vec![u32::MAX]);
    }
}
