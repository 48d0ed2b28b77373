//! Verdict extraction from judge responses.
//!
//! The prompt asks for a 5-point verdict (A-E). Where the endpoint returns
//! logprobs for the verdict token, the letters are weighted by probability;
//! otherwise the letter is read from the tail of the response text.

use duelrank_core::Winner;
use serde::Deserialize;

/// Verdict letters, strongest preference for option 1 first.
const VERDICT_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

/// How much each letter says option 1 is the better one.
const LETTER_WEIGHTS: [f64; 5] = [1.0, 0.75, 0.5, 0.25, 0.0];

/// Minimum probability mass the A-E tokens must cover before logprobs are trusted.
const MIN_LETTER_MASS: f64 = 0.99;

/// How many tokens after the "Verdict" marker are searched for the letter.
const VERDICT_WINDOW: usize = 10;

/// A single top-logprob entry from an OpenAI-style response.
#[derive(Debug, Deserialize)]
pub struct TopLogprob {
    pub token: String,
    pub logprob: f64,
}

/// A sampled token with its alternatives.
#[derive(Debug, Deserialize)]
pub struct LogprobContent {
    pub token: String,
    pub top_logprobs: Option<Vec<TopLogprob>>,
}

/// A parsed judgement on one ordered pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    /// 1.0 = option 1 clearly better, 0.0 = option 2 clearly better.
    pub first_preference: f64,
}

impl Verdict {
    /// The side the judge leans towards, or `None` for a draw.
    pub fn winner(&self) -> Option<Winner> {
        if self.first_preference > 0.5 {
            Some(Winner::First)
        } else if self.first_preference < 0.5 {
            Some(Winner::Second)
        } else {
            None
        }
    }
}

fn letter_index(c: char) -> Option<usize> {
    VERDICT_LETTERS.iter().position(|&l| l == c.to_ascii_uppercase())
}

/// Index of the first token after a "Verdict" marker, which tokenizers may split.
fn verdict_marker_end(tokens: &[&str]) -> usize {
    for (i, raw) in tokens.iter().enumerate() {
        let t = raw.trim().to_lowercase();
        if t.starts_with("verdict") {
            return i + 1;
        }
        if (t == "ver" || t == "verd") && i + 1 < tokens.len() {
            let next = tokens[i + 1].trim().to_lowercase();
            if matches!(next.as_str(), "dict" | "dict:" | "ict" | "ict:") {
                return i + 2;
            }
        }
    }
    0
}

/// Whether a token is a bare verdict letter, optionally followed by a colon.
fn is_letter_token(tok: &str) -> bool {
    let mut chars = tok.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if letter_index(first).is_none() {
        return false;
    }
    let rest = chars.as_str();
    if !rest.is_empty() && rest != ":" {
        return false;
    }
    // a bare lowercase "a" is usually the article
    !(first == 'a' && rest.is_empty())
}

/// Probability-weighted preference from the verdict token's logprobs.
fn preference_from_logprobs(logprobs: &[LogprobContent]) -> Option<f64> {
    let tokens: Vec<&str> = logprobs.iter().map(|lp| lp.token.as_str()).collect();
    let start = verdict_marker_end(&tokens);
    let end = (start + VERDICT_WINDOW).min(tokens.len());

    let i = (start..end).find(|&i| is_letter_token(tokens[i].trim()))?;
    let alternatives = logprobs[i].top_logprobs.as_deref().filter(|t| !t.is_empty())?;

    let mut mass = [0.0_f64; 5];
    for alt in alternatives {
        let clean = alt.token.trim().trim_end_matches(':');
        let mut chars = clean.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(idx) = letter_index(c) {
                mass[idx] += alt.logprob.exp();
            }
        }
    }

    let total: f64 = mass.iter().sum();
    if total < MIN_LETTER_MASS {
        return None;
    }
    Some(mass.iter().zip(LETTER_WEIGHTS).map(|(p, w)| p / total * w).sum())
}

/// Reads a line like "D: Option 2 narrowly wins" from the last few lines.
fn letter_from_text(text: &str) -> Option<usize> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].iter().rev().find_map(|line| {
        let mut chars = line.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), Some(':')) => letter_index(c),
            _ => None,
        }
    })
}

/// Parse a judge response. Logprobs win over text; `None` if neither yields a letter.
pub fn parse_verdict(text: &str, logprobs: &[LogprobContent]) -> Option<Verdict> {
    let first_preference = preference_from_logprobs(logprobs)
        .or_else(|| letter_from_text(text).map(|idx| LETTER_WEIGHTS[idx]))?;
    Some(Verdict { first_preference })
}
