//! duelrank-core: rank items by pairwise comparisons.
//!
//! Items → comparator decisions → a ranking. No IO, no HTTP, no filesystem;
//! the decision source (a person, a model, a function) is plugged in through
//! the [`Comparator`] trait.
//!
//! Two ways to rank:
//!
//! - [`compare_all_sort`] asks every pair once and scores items by their wins.
//!   Cycles in the answers surface as ties, which [`break_ties`] re-asks
//!   within each tied run (or [`rank_until_settled`] does both in a loop).
//! - [`merge_insertion_sort`] produces a strict order with close to the minimum
//!   number of questions, assuming the answers are consistent.
//!
//! # Quick start
//!
//! ```rust
//! use duelrank_core::{compare_all_sort, FnComparator, RankedEntry, Winner};
//! use std::convert::Infallible;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let longer_wins = FnComparator(|a: &&str, b: &&str| -> Result<Winner, Infallible> {
//!     Ok(if a.len() > b.len() { Winner::First } else { Winner::Second })
//! });
//!
//! let ranking = compare_all_sort(&["ccc", "a", "bb"], &longer_wins).await.unwrap();
//! assert_eq!(ranking, vec![
//!     RankedEntry::new("a", 0),
//!     RankedEntry::new("bb", 1),
//!     RankedEntry::new("ccc", 2),
//! ]);
//! # }
//! ```

pub mod combinatorics;
pub mod comparator;
pub mod error;
pub mod exhaustive;
pub mod merge_insertion;
pub mod scores;
pub mod tiebreak;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export primary public API at crate root.
pub use combinatorics::{combinations2, compare_all_comparisons, permutations, Combinations2, Permutations};
pub use comparator::{ChannelClosed, ChannelComparator, Comparator, ComparisonRequest, CountingComparator, FnComparator};
pub use error::RankError;
pub use exhaustive::compare_all_sort;
pub use merge_insertion::{
    make_merge_insertion_groups, merge_insertion_group_sizes, merge_insertion_max_comparisons,
    merge_insertion_sort, MergeInsertionGroupSizes,
};
pub use scores::{find_tie_groups, normalize_scores, sort_results};
pub use tiebreak::{break_ties, rank_until_settled, Settlement};
pub use types::{RankedEntry, RankedResults, SortOrder, TieGroup, Winner};
