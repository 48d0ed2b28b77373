//! In-place helpers over ranked result sets: sorting, score normalization and
//! tie detection.
use crate::types::{RankedEntry, SortOrder, TieGroup};

/// Sort by score, then by item ascending. Mutates `results` in place.
pub fn sort_results<T: Ord>(results: &mut [RankedEntry<T>], order: SortOrder) {
    match order {
        SortOrder::Ascending => {
            results.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.item.cmp(&b.item)))
        }
        SortOrder::Descending => {
            results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.item.cmp(&b.item)))
        }
    }
}

/// Rewrite scores in place so they start at zero and have no gaps. Ties are kept.
///
/// `results` must already be sorted ascending by score. Items are not looked at.
pub fn normalize_scores<T>(results: &mut [RankedEntry<T>]) {
    let mut prev: Option<usize> = None;
    let mut current = 0;
    for entry in results.iter_mut() {
        match prev {
            Some(p) if p == entry.score => {}
            Some(_) => current += 1,
            None => {}
        }
        prev = Some(entry.score);
        entry.score = current;
    }
}

/// Index ranges of every run of two or more equal scores.
///
/// `results` must already be sorted by score. Ranges are half-open, disjoint and
/// ascending; a score held by a single entry produces no range.
pub fn find_tie_groups<T>(results: &[RankedEntry<T>]) -> Vec<TieGroup> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=results.len() {
        if i == results.len() || results[i].score != results[start].score {
            if i - start > 1 {
                groups.push(start..i);
            }
            start = i;
        }
    }
    groups
}

/// True if scores never decrease from one entry to the next.
pub(crate) fn is_sorted_ascending<T>(results: &[RankedEntry<T>]) -> bool {
    results.windows(2).all(|w| w[0].score <= w[1].score)
}
