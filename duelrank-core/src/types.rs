//! Value types shared by every ranking operation.
use std::collections::HashSet;
use std::hash::Hash;
use std::ops::Range;

/// Outcome of a single comparison. There is no "equal" variant:
/// ties only ever emerge from aggregate win counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Winner {
    /// The first item of the ordered pair is the greater one.
    First,
    /// The second item of the ordered pair is the greater one.
    Second,
}

impl Winner {
    /// Pick the winning item out of the pair that produced this outcome.
    pub fn pick<'a, T>(self, first: &'a T, second: &'a T) -> &'a T {
        match self {
            Winner::First => first,
            Winner::Second => second,
        }
    }
}

/// Direction for [`sort_results`](crate::scores::sort_results).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// An item together with its score. Higher scores mean the item won more often.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedEntry<T> {
    pub item: T,
    pub score: usize,
}

impl<T> RankedEntry<T> {
    pub fn new(item: T, score: usize) -> Self {
        RankedEntry { item, score }
    }
}

impl<T> From<(T, usize)> for RankedEntry<T> {
    fn from((item, score): (T, usize)) -> Self {
        RankedEntry { item, score }
    }
}

/// An ordered result set. Items within one result set are unique.
pub type RankedResults<T> = Vec<RankedEntry<T>>;

/// Half-open index range of a run of equal scores.
pub type TieGroup = Range<usize>;

/// Number of items that occur more than once in `items`, or 0 if all are unique.
pub(crate) fn count_duplicates<'a, T, I>(items: I) -> usize
where
    T: Hash + Eq + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| !seen.insert(*item)).count()
}
