//! Key segmentation.
//!
//! A key is split on every occurrence of the separator, then numeric
//! segments are moved behind the non-numeric ones (stable within each class).
//! Ids embedded anywhere in a key therefore end up at the tail, so keys of the
//! same shape share a branch: `user:42:profile` descends as
//! `user` → `profile` → `42`.

use smallvec::SmallVec;

/// Segments of one key. Most keys have only a handful, so they stay inline.
pub type Segments<'k> = SmallVec<[&'k str; 8]>;

/// A segment is numeric when it is a non-empty run of ASCII digits.
///
/// No sign, decimal point or locale digits: `-1`, `1.5` and `٣` are all
/// treated as names.
#[inline]
pub fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmenter {
    separator: String,
}

impl Segmenter {
    /// `separator` must be non-empty; [`TreeConfig::validate`](crate::TreeConfig::validate)
    /// enforces this before a tree builds its segmenter.
    pub fn new(separator: impl Into<String>) -> Self {
        let separator = separator.into();
        debug_assert!(!separator.is_empty());
        Self { separator }
    }

    #[inline]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Split `key` and reorder the segments. Always yields at least one
    /// segment (the empty key yields `[""]`).
    pub fn split<'k>(&self, key: &'k str) -> Segments<'k> {
        let mut out: Segments<'k> = key
            .split(self.separator.as_str())
            .filter(|s| !is_numeric(s))
            .collect();
        out.extend(
            key.split(self.separator.as_str())
                .filter(|s| is_numeric(s)),
        );
        out
    }
}
