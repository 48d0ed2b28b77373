//! Merge-insertion sort (Ford–Johnson): a full ordering with close to the
//! minimum possible number of comparisons.
//!
//! Pair up the items and compare each pair once, recursively sort the pair
//! winners into a main chain, then binary-insert the losers. Losers are inserted
//! in the grouped order from the literature (group sizes 2, 2, 6, 10, 22, ...,
//! each group back to front), which keeps every binary search within a range of
//! 2^k - 1 elements and so reaches the bound of [`merge_insertion_max_comparisons`].
use std::hash::Hash;

use futures_util::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::comparator::Comparator;
use crate::error::{RankError, Result};
use crate::types::{count_duplicates, Winner};

/// Worst-case number of comparisons merge-insertion sort needs for `n` items.
///
/// This is OEIS A001768, the sum over i in 1..=n of ceil(log2(3i/4)), evaluated
/// with its closed form in integer arithmetic.
pub fn merge_insertion_max_comparisons(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let n = n as u128;
    let ceil_log2_3n_4 = ceil_log2(3 * n).saturating_sub(2);
    let floor_log2_6n = floor_log2(6 * n);
    let total = n * ceil_log2_3n_4 as u128 + (floor_log2_6n / 2) as u128 - (1u128 << floor_log2_6n) / 3;
    total as usize
}

fn ceil_log2(x: u128) -> u32 {
    if x <= 1 {
        0
    } else {
        u128::BITS - (x - 1).leading_zeros()
    }
}

fn floor_log2(x: u128) -> u32 {
    u128::BITS - 1 - x.leading_zeros()
}

/// Sizes of the insertion groups: a(1) = 2, a(n) = 2^n - a(n-1).
///
/// Unbounded. Once 2^n no longer fits in a `usize` every further size is
/// `usize::MAX`, which is larger than any slice could need.
#[derive(Debug, Clone, Default)]
pub struct MergeInsertionGroupSizes {
    exponent: u32,
    prev: usize,
}

/// A fresh group-size sequence starting at 2, 2, 6, 10, 22, ...
pub fn merge_insertion_group_sizes() -> MergeInsertionGroupSizes {
    MergeInsertionGroupSizes::default()
}

impl Iterator for MergeInsertionGroupSizes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.exponent = self.exponent.saturating_add(1);
        let size = 1usize
            .checked_shl(self.exponent)
            .and_then(|power| power.checked_sub(self.prev))
            .unwrap_or(usize::MAX);
        self.prev = size;
        Some(size)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Reorder `items` into insertion order: consecutive groups of
/// [`merge_insertion_group_sizes`], each one reversed.
pub fn make_merge_insertion_groups<U: Clone>(items: &[U]) -> Vec<U> {
    let mut out = Vec::with_capacity(items.len());
    let mut start = 0usize;
    for size in merge_insertion_group_sizes() {
        let end = start.saturating_add(size).min(items.len());
        out.extend(items[start..end].iter().rev().cloned());
        if end - start < size {
            break;
        }
        start = end;
    }
    out
}

/// Sort `items` so that every item comes before the items that beat it.
///
/// Zero or one item is returned as-is without asking the comparator. Comparisons
/// are issued one at a time since each answer steers the next question. The
/// comparator must answer consistently with some total order for the output to
/// be meaningful. Duplicates are rejected before anything is compared.
pub async fn merge_insertion_sort<T, C>(items: &[T], comparator: &C) -> Result<Vec<T>, C::Error>
where
    T: Hash + Eq + Clone + Sync,
    C: Comparator<T> + ?Sized,
{
    if items.len() <= 1 {
        return Ok(items.to_vec());
    }
    let duplicates = count_duplicates(items);
    if duplicates > 0 {
        return Err(RankError::DuplicateItems { count: duplicates });
    }

    debug!(
        items = items.len(),
        max_comparisons = merge_insertion_max_comparisons(items.len()),
        "merge-insertion sort started"
    );
    let order = sort_indices(items, (0..items.len()).collect(), comparator).await?;
    Ok(order.into_iter().map(|i| items[i].clone()).collect())
}

/// Recursive step over indices into `items`. Returns the same indices, sorted.
fn sort_indices<'a, T, C>(
    items: &'a [T],
    indices: Vec<usize>,
    comparator: &'a C,
) -> BoxFuture<'a, Result<Vec<usize>, C::Error>>
where
    T: Sync,
    C: Comparator<T> + ?Sized,
{
    async move {
        if indices.len() <= 1 {
            return Ok(indices);
        }

        // (loser, winner) for each consecutive pair
        let mut pairs = Vec::with_capacity(indices.len() / 2);
        for pair in indices.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            let winner = comparator
                .compare(&items[a], &items[b])
                .await
                .map_err(RankError::Comparator)?;
            pairs.push(match winner {
                Winner::First => (b, a),
                Winner::Second => (a, b),
            });
        }
        let leftover = if indices.len() % 2 == 1 { indices.last().copied() } else { None };

        let winners = pairs.iter().map(|&(_, winner)| winner).collect();
        let mut chain = sort_indices(items, winners, comparator).await?;

        let mut partner = vec![None; items.len()];
        for &(loser, winner) in &pairs {
            partner[winner] = Some(loser);
        }
        // losers in the order of their winners in the chain, each bounded by its winner
        let mut pending: Vec<(usize, Option<usize>)> = chain
            .iter()
            .filter_map(|&winner| partner[winner].map(|loser| (loser, Some(winner))))
            .collect();
        if !pending.is_empty() {
            // the smallest winner's partner is below everything in the chain
            let (first, _) = pending.remove(0);
            chain.insert(0, first);
        }
        if let Some(item) = leftover {
            pending.push((item, None));
        }

        for (item, bound) in make_merge_insertion_groups(&pending) {
            let end = bound
                .and_then(|winner| chain.iter().position(|&c| c == winner))
                .unwrap_or(chain.len());
            binary_insert(items, &mut chain, item, end, comparator).await?;
        }
        Ok(chain)
    }
    .boxed()
}

/// Insert `item` into the sorted `chain[..end]` by binary search.
async fn binary_insert<T, C>(
    items: &[T],
    chain: &mut Vec<usize>,
    item: usize,
    end: usize,
    comparator: &C,
) -> Result<(), C::Error>
where
    T: Sync,
    C: Comparator<T> + ?Sized,
{
    let (mut lo, mut hi) = (0, end);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let winner = comparator
            .compare(&items[item], &items[chain[mid]])
            .await
            .map_err(RankError::Comparator)?;
        match winner {
            Winner::Second => hi = mid,
            Winner::First => lo = mid + 1,
        }
    }
    chain.insert(lo, item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinatorics::permutations;
    use crate::comparator::{CountingComparator, FnComparator};
    use crate::exhaustive::compare_all_sort;
    use crate::test_support::{entries, strings, FailComparator, OrderComparator, StrictComparator, TestError};
    use std::convert::Infallible;

    fn letters(n: usize) -> Vec<String> {
        (0..n).map(|i| char::from(b'A' + i as u8).to_string()).collect()
    }

    fn by_value() -> FnComparator<impl Fn(&String, &String) -> std::result::Result<Winner, Infallible> + Sync> {
        FnComparator(|a: &String, b: &String| -> std::result::Result<Winner, Infallible> {
            Ok(if a > b { Winner::First } else { Winner::Second })
        })
    }

    #[test]
    fn test_max_comparisons_matches_oeis() {
        // https://oeis.org/A001768
        let expected = [
            0, 1, 3, 5, 7, 10, 13, 16, 19, 22, 26, 30, 34, 38, 42, 46, 50, 54, 58, 62, 66, 71, 76,
            81, 86, 91, 96, 101, 106, 111, 116, 121, 126, 131, 136, 141, 146, 151, 156, 161, 166,
            171, 177, 183, 189, 195, 201, 207, 213, 219, 225, 231, 237, 243, 249, 255,
        ];
        assert_eq!(merge_insertion_max_comparisons(0), 0);
        for (i, &exp) in expected.iter().enumerate() {
            assert_eq!(merge_insertion_max_comparisons(i + 1), exp, "n = {}", i + 1);
        }
    }

    #[test]
    fn test_max_comparisons_closed_form_matches_sum() {
        let mut sum = 0usize;
        for i in 1..2000usize {
            // ceil(log2(3i/4)) = smallest k >= 0 with 4 * 2^k >= 3i
            let mut k = 0;
            while (4usize << k) < 3 * i {
                k += 1;
            }
            sum += k;
            assert_eq!(merge_insertion_max_comparisons(i), sum, "n = {i}");
        }
    }

    #[test]
    fn test_group_sizes() {
        let sizes: Vec<usize> = merge_insertion_group_sizes().take(10).collect();
        assert_eq!(sizes, vec![2, 2, 6, 10, 22, 42, 86, 170, 342, 682]);
        // adjacent groups sum to powers of two
        for (n, w) in sizes.windows(2).enumerate() {
            assert_eq!(w[0] + w[1], 1 << (n + 2));
        }
    }

    #[test]
    fn test_group_sizes_restartable_and_unbounded() {
        let mut sizes = merge_insertion_group_sizes();
        assert_eq!(sizes.next(), Some(2));
        let copy = sizes.clone();
        assert_eq!(sizes.take(3).collect::<Vec<_>>(), copy.take(3).collect::<Vec<_>>());
        assert_eq!(merge_insertion_group_sizes().next(), Some(2));

        let far: Vec<usize> = merge_insertion_group_sizes().skip(100).take(3).collect();
        assert_eq!(far, vec![usize::MAX; 3]);
    }

    #[test]
    fn test_make_groups() {
        assert_eq!(make_merge_insertion_groups::<u8>(&[]), Vec::<u8>::new());
        assert_eq!(make_merge_insertion_groups(&[0]), vec![0]);
        assert_eq!(make_merge_insertion_groups(&[0, 1]), vec![1, 0]);
        assert_eq!(make_merge_insertion_groups(&[0, 1, 2]), vec![1, 0, 2]);
        assert_eq!(make_merge_insertion_groups(&[0, 1, 2, 3]), vec![1, 0, 3, 2]);
        let items: Vec<u32> = (0..11).collect();
        assert_eq!(make_merge_insertion_groups(&items), vec![1, 0, 3, 2, 9, 8, 7, 6, 5, 4, 10]);
    }

    #[tokio::test]
    async fn test_trivial_inputs_make_no_calls() {
        assert_eq!(merge_insertion_sort(&strings(&[]), &FailComparator).await.unwrap(), strings(&[]));
        assert_eq!(merge_insertion_sort(&strings(&["A"]), &FailComparator).await.unwrap(), strings(&["A"]));
    }

    #[tokio::test]
    async fn test_sorts_every_permutation() {
        for n in 0..=6 {
            let expected = letters(n);
            for perm in permutations(&expected) {
                let sorted = merge_insertion_sort(&perm, &by_value()).await.unwrap();
                assert_eq!(sorted, expected, "input {perm:?}");
            }
        }
    }

    #[tokio::test]
    async fn test_call_count_within_bound_for_every_permutation() {
        for n in 0..=7 {
            let expected = letters(n);
            let bound = merge_insertion_max_comparisons(n);
            for perm in permutations(&expected) {
                let comp = StrictComparator::new(OrderComparator::new(&["A", "B", "C", "D", "E", "F", "G"]), bound);
                let sorted = merge_insertion_sort(&perm, &comp).await.unwrap();
                assert_eq!(sorted, expected);
                assert!(comp.calls() <= bound, "{} calls for {perm:?}", comp.calls());
            }
        }
    }

    #[tokio::test]
    async fn test_call_count_beats_exhaustive() {
        let comp = CountingComparator::new(OrderComparator::new(&["A", "B", "C", "D", "E"]));
        let items = strings(&["C", "D", "B", "E", "A"]);

        assert_eq!(
            compare_all_sort(&items, &comp).await.unwrap(),
            entries(&[("A", 0), ("B", 1), ("C", 2), ("D", 3), ("E", 4)])
        );
        assert_eq!(comp.calls(), 10);

        comp.reset();
        assert_eq!(merge_insertion_sort(&items, &comp).await.unwrap(), strings(&["A", "B", "C", "D", "E"]));
        assert!(comp.calls() <= merge_insertion_max_comparisons(5));
    }

    #[tokio::test]
    async fn test_larger_inputs_stay_within_bound() {
        for n in [8usize, 13, 21, 34, 55] {
            let expected: Vec<u32> = (0..n as u32).collect();
            // a fixed shuffle: multiply by a unit mod n
            let step = (n / 2 + 1..n).find(|s| gcd(*s, n) == 1).unwrap_or(1);
            let input: Vec<u32> = (0..n).map(|i| ((i * step) % n) as u32).collect();
            let comp = CountingComparator::new(FnComparator(|a: &u32, b: &u32| -> std::result::Result<Winner, Infallible> {
                Ok(if a > b { Winner::First } else { Winner::Second })
            }));
            let sorted = merge_insertion_sort(&input, &comp).await.unwrap();
            assert_eq!(sorted, expected);
            assert!(comp.calls() <= merge_insertion_max_comparisons(n), "n = {n}: {} calls", comp.calls());
        }
    }

    fn gcd(a: usize, b: usize) -> usize {
        if b == 0 { a } else { gcd(b, a % b) }
    }

    #[tokio::test]
    async fn test_rejects_duplicates() {
        let err = merge_insertion_sort(&strings(&["A", "B", "A"]), &FailComparator).await.unwrap_err();
        assert!(matches!(err, RankError::DuplicateItems { count: 1 }));
    }

    #[tokio::test]
    async fn test_propagates_comparator_failure() {
        let comp = OrderComparator::new(&["A", "B"]);
        let err = merge_insertion_sort(&strings(&["A", "B", "Q"]), &comp).await.unwrap_err();
        assert!(matches!(
            err.into_comparator_error(),
            Some(TestError::Unhandled(_, _))
        ));
    }
}
