//! Output formatting: terminal table and JSON.

use duelrank_core::{RankedEntry, TieGroup};
use serde::Serialize;

/// What a finished run reports besides the ranking itself.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub method: &'static str,
    pub comparisons: usize,
    pub max_comparisons: usize,
    pub retries: usize,
    pub tie_rounds: usize,
    /// Tie groups left after the last tie-break round, as index ranges into the ascending ranking.
    pub unresolved: Vec<TieGroup>,
}

#[derive(Serialize)]
struct JsonRankedItem<'a> {
    rank: usize,
    name: &'a str,
    score: usize,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    items: Vec<JsonRankedItem<'a>>,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Ranking rows best-first: (rank, name, score). Tied items share a rank.
fn rows(ranking: &[RankedEntry<String>]) -> Vec<(usize, &str, usize)> {
    let mut out = Vec::with_capacity(ranking.len());
    let mut rank = 0;
    let mut previous = None;
    for (i, entry) in ranking.iter().rev().enumerate() {
        if previous != Some(entry.score) {
            rank = i + 1;
            previous = Some(entry.score);
        }
        out.push((rank, entry.item.as_str(), entry.score));
    }
    out
}

/// Print results as a formatted terminal table, best item first.
pub fn print_table(ranking: &[RankedEntry<String>], summary: &RunSummary) {
    let name_width = ranking
        .iter()
        .map(|r| r.item.chars().count())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Item"

    println!(" # | {:<name_width$} | Score", "Item");
    println!("---|-{}-|------", "-".repeat(name_width));
    for (rank, name, score) in rows(ranking) {
        println!("{rank:>2} | {name:<name_width$} | {score:>5}");
    }

    println!(
        "\n{} items ranked by {} ({} comparisons, at most {} needed)",
        ranking.len(),
        summary.method,
        summary.comparisons,
        summary.max_comparisons,
    );
    if summary.tie_rounds > 0 {
        println!("Tie-break rounds: {}", summary.tie_rounds);
    }
    if !summary.unresolved.is_empty() {
        println!("Unresolved ties: {} group(s)", summary.unresolved.len());
    }
}

/// Print results as JSON, best item first.
pub fn print_json(ranking: &[RankedEntry<String>], summary: &RunSummary) {
    let items = rows(ranking)
        .into_iter()
        .map(|(rank, name, score)| JsonRankedItem { rank, name, score })
        .collect();
    let output = JsonOutput { items, summary };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::bail(format!("Failed to serialize results: {e}")),
    }
}
