//! Exhaustive pairwise ranking: every item against every other item, once.
use std::hash::Hash;

use tracing::{debug, trace};

use crate::combinatorics::{combinations2, compare_all_comparisons};
use crate::comparator::Comparator;
use crate::error::{RankError, Result};
use crate::scores::{normalize_scores, sort_results};
use crate::types::{count_duplicates, RankedEntry, RankedResults, SortOrder, Winner};

/// Rank `items` by comparing every unordered pair exactly once.
///
/// Pairs are asked strictly one after another in row-major index order, so
/// exactly n(n-1)/2 comparisons are made no matter what the comparator answers.
/// Each win is worth one point; the result is sorted ascending by score and
/// normalized, so cycles in the comparator's answers show up as ties.
///
/// Duplicates are rejected before the comparator is called. The first
/// comparator failure aborts the whole ranking.
pub async fn compare_all_sort<T, C>(items: &[T], comparator: &C) -> Result<RankedResults<T>, C::Error>
where
    T: Ord + Hash + Clone + Sync,
    C: Comparator<T> + ?Sized,
{
    let duplicates = count_duplicates(items);
    if duplicates > 0 {
        return Err(RankError::DuplicateItems { count: duplicates });
    }

    debug!(
        items = items.len(),
        comparisons = compare_all_comparisons(items.len()),
        "exhaustive ranking started"
    );

    let mut wins = vec![0usize; items.len()];
    let indices: Vec<usize> = (0..items.len()).collect();
    for (&i, &j) in combinations2(&indices) {
        let winner = comparator
            .compare(&items[i], &items[j])
            .await
            .map_err(RankError::Comparator)?;
        trace!(first = i, second = j, ?winner, "compared");
        match winner {
            Winner::First => wins[i] += 1,
            Winner::Second => wins[j] += 1,
        }
    }

    let mut results: RankedResults<T> = items
        .iter()
        .cloned()
        .zip(wins)
        .map(|(item, score)| RankedEntry::new(item, score))
        .collect();
    sort_results(&mut results, SortOrder::Ascending);
    normalize_scores(&mut results);
    Ok(results)
}
