//! Tie-breaking: re-rank only the tied runs of an existing ranking and splice
//! the corrected scores back in.
use std::hash::Hash;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::comparator::Comparator;
use crate::error::{RankError, Result};
use crate::exhaustive::compare_all_sort;
use crate::scores::{find_tie_groups, is_sorted_ascending};
use crate::types::{count_duplicates, RankedEntry, RankedResults, TieGroup};

/// Re-rank every tie group of `results` independently and return the merged ranking.
///
/// `results` must be sorted ascending by score. Each tie group is ranked with
/// [`compare_all_sort`]; the groups run concurrently and every one of them must
/// finish before anything is spliced. A group's entries are renumbered to
/// continue from the score just before it, and every entry after it is shifted
/// by the same amount so the sequence stays contiguous. Entries outside any
/// group keep their position; their scores only move with the shift applied by
/// the groups before them.
///
/// The returned ranking is a fresh copy; `results` is never modified. Scores
/// that would not fit in a `usize` after renumbering give
/// [`RankError::InvalidArgument`].
pub async fn break_ties<T, C>(results: &[RankedEntry<T>], comparator: &C) -> Result<RankedResults<T>, C::Error>
where
    T: Ord + Hash + Clone + Sync,
    C: Comparator<T> + ?Sized,
{
    let duplicates = count_duplicates(results.iter().map(|e| &e.item));
    if duplicates > 0 {
        return Err(RankError::DuplicateItems { count: duplicates });
    }
    if !is_sorted_ascending(results) {
        return Err(RankError::InvalidArgument(
            "results must be sorted ascending by score before breaking ties".to_string(),
        ));
    }

    let groups = find_tie_groups(results);
    let mut res: RankedResults<T> = results.to_vec();
    if groups.is_empty() {
        return Ok(res);
    }
    debug!(groups = groups.len(), entries = results.len(), "breaking ties");

    let group_items: Vec<Vec<T>> = groups
        .iter()
        .map(|g| results[g.clone()].iter().map(|e| e.item.clone()).collect())
        .collect();
    let sub_rankings = try_join_all(group_items.iter().map(|items| compare_all_sort(items, comparator))).await?;

    for (group, sub) in groups.iter().zip(sub_rankings) {
        splice_group(&mut res, group, sub).ok_or_else(|| {
            RankError::<C::Error>::InvalidArgument(format!(
                "scores too large to renumber the tie group at {}..{}",
                group.start, group.end
            ))
        })?;
    }
    Ok(res)
}

/// Write a locally normalized sub-ranking over `group` and shift everything after it.
///
/// Returns `None` if a renumbered score would not fit in a `usize`.
fn splice_group<T>(res: &mut [RankedEntry<T>], group: &TieGroup, sub: RankedResults<T>) -> Option<()> {
    debug_assert_eq!(group.len(), sub.len());
    let base_before = match group.start {
        0 => 0,
        start => res[start - 1].score.checked_add(1)?,
    };
    for (slot, entry) in res[group.clone()].iter_mut().zip(sub) {
        slot.item = entry.item;
        slot.score = entry.score.checked_add(base_before)?;
    }

    if group.end < res.len() {
        let next_score = res[group.end - 1].score.checked_add(1)?;
        let first_after = res[group.end].score;
        // scores after the group are >= first_after, so the subtraction never underflows
        for entry in &mut res[group.end..] {
            entry.score = (entry.score - first_after).checked_add(next_score)?;
        }
    }
    Some(())
}

/// Outcome of [`rank_until_settled`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settlement<T> {
    /// Final ranking, ascending by score.
    pub results: RankedResults<T>,
    /// How many tie-breaking rounds ran after the initial exhaustive ranking.
    pub tie_rounds: usize,
    /// Tie groups still present in `results`. Empty once fully settled.
    pub unresolved: Vec<TieGroup>,
}

impl<T> Settlement<T> {
    pub fn is_settled(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Rank `items` exhaustively, then break ties round after round until none are
/// left or `max_tie_rounds` rounds have run.
///
/// A comparator whose answers cycle inside a group keeps producing the same tie,
/// so the round limit is what guarantees termination.
pub async fn rank_until_settled<T, C>(
    items: &[T],
    comparator: &C,
    max_tie_rounds: usize,
) -> Result<Settlement<T>, C::Error>
where
    T: Ord + Hash + Clone + Sync,
    C: Comparator<T> + ?Sized,
{
    let mut results = compare_all_sort(items, comparator).await?;
    let mut unresolved = find_tie_groups(&results);
    let mut tie_rounds = 0;
    while !unresolved.is_empty() && tie_rounds < max_tie_rounds {
        tie_rounds += 1;
        debug!(round = tie_rounds, groups = unresolved.len(), "tie-break round");
        results = break_ties(&results, comparator).await?;
        unresolved = find_tie_groups(&results);
    }
    Ok(Settlement {
        results,
        tie_rounds,
        unresolved,
    })
}
