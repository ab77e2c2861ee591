use std::collections::BTreeMap;

/// Subsampled mapping of logical offsets to byte positions.
///
/// An entry `(logical, position)` means that every record with a logical offset
/// up to `logical` ends before `position` in the segment. Keys and values are
/// strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoarseIndex(BTreeMap<i64, i64>);

impl CoarseIndex {
    pub fn new() -> CoarseIndex {
        CoarseIndex(BTreeMap::new())
    }

    /// Appends a mapping if it keeps both keys and values strictly increasing.
    pub(crate) fn push(&mut self, logical_offset: i64, byte_position: i64) -> bool {
        if let Some((&last_offset, &last_position)) = self.0.last_key_value() {
            if logical_offset <= last_offset || byte_position <= last_position {
                return false;
            }
        }
        self.0.insert(logical_offset, byte_position);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(logical_offset, byte_position)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    pub fn get(&self, logical_offset: i64) -> Option<i64> {
        self.0.get(&logical_offset).copied()
    }

    /// Returns the entry with the greatest logical offset `<= logical_offset`.
    pub fn floor(&self, logical_offset: i64) -> Option<(i64, i64)> {
        self.0
            .range(..=logical_offset)
            .next_back()
            .map(|(&k, &v)| (k, v))
    }

    /// Returns the byte span that contains all records with logical offsets in
    /// `first..=last`.
    ///
    /// `None` for the start means the span begins at the segment start, `None`
    /// for the end means it runs to the end of the segment.
    pub fn byte_range(&self, first: i64, last: i64) -> (Option<i64>, Option<i64>) {
        let start = self.0.range(..first).next_back().map(|(_, &v)| v);
        let end = self.0.range(last..).next().map(|(_, &v)| v);
        (start, end)
    }

    pub fn into_inner(self) -> BTreeMap<i64, i64> {
        self.0
    }
}
