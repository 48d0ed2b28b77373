//! Comparators and fixtures shared by the unit tests.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::comparator::Comparator;
use crate::types::{RankedEntry, RankedResults, Winner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TestError {
    #[error("comparator should not have been called ({0} vs {1})")]
    Unexpected(String, String),
    #[error("unhandled comparison {0} vs {1}")]
    Unhandled(String, String),
    #[error("compared {0} with itself")]
    SelfComparison(String),
    #[error("duplicate comparison of {0} and {1}")]
    Repeated(String, String),
    #[error("too many comparator calls ({0})")]
    TooManyCalls(usize),
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn entries(pairs: &[(&str, usize)]) -> RankedResults<String> {
    pairs.iter().map(|&(item, score)| RankedEntry::new(item.to_string(), score)).collect()
}

/// Items later in `order` beat items earlier in it.
pub struct OrderComparator {
    order: Vec<String>,
    calls: AtomicUsize,
}

impl OrderComparator {
    pub fn new(order: &[&str]) -> Self {
        OrderComparator {
            order: strings(order),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn position(&self, item: &str) -> Option<usize> {
        self.order.iter().position(|o| o == item)
    }
}

#[async_trait]
impl Comparator<String> for OrderComparator {
    type Error = TestError;

    async fn compare(&self, first: &String, second: &String) -> Result<Winner, TestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (self.position(first), self.position(second)) {
            (Some(a), Some(b)) if a > b => Ok(Winner::First),
            (Some(_), Some(_)) => Ok(Winner::Second),
            _ => Err(TestError::Unhandled(first.clone(), second.clone())),
        }
    }
}

/// Looks every answer up in a table keyed by the lexicographically ordered pair,
/// which makes non-transitive preferences easy to express.
pub struct TableComparator {
    table: HashMap<(String, String), Winner>,
}

impl TableComparator {
    /// Each `(a, b, w)` is the outcome of comparing `a` then `b`, with `a < b`.
    pub fn new(rows: &[(&str, &str, Winner)]) -> Self {
        let table = rows
            .iter()
            .map(|&(a, b, w)| ((a.to_string(), b.to_string()), w))
            .collect();
        TableComparator { table }
    }
}

#[async_trait]
impl Comparator<String> for TableComparator {
    type Error = TestError;

    async fn compare(&self, first: &String, second: &String) -> Result<Winner, TestError> {
        let swapped = first > second;
        let key = if swapped {
            (second.clone(), first.clone())
        } else {
            (first.clone(), second.clone())
        };
        let winner = *self
            .table
            .get(&key)
            .ok_or_else(|| TestError::Unhandled(first.clone(), second.clone()))?;
        Ok(match (swapped, winner) {
            (false, w) => w,
            (true, Winner::First) => Winner::Second,
            (true, Winner::Second) => Winner::First,
        })
    }
}

/// Fails the moment it is asked anything.
pub struct FailComparator;

#[async_trait]
impl Comparator<String> for FailComparator {
    type Error = TestError;

    async fn compare(&self, first: &String, second: &String) -> Result<Winner, TestError> {
        Err(TestError::Unexpected(first.clone(), second.clone()))
    }
}

/// Rejects self-comparisons, repeated unordered pairs and more than `max_calls`
/// calls, then delegates. Every pair asked is logged in order.
pub struct StrictComparator<C> {
    inner: C,
    max_calls: usize,
    log: Mutex<Vec<(String, String)>>,
    seen: Mutex<HashSet<(String, String)>>,
}

impl<C> StrictComparator<C> {
    pub fn new(inner: C, max_calls: usize) -> Self {
        StrictComparator {
            inner,
            max_calls,
            log: Mutex::new(Vec::new()),
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn log(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl<C: Comparator<String, Error = TestError>> Comparator<String> for StrictComparator<C> {
    type Error = TestError;

    async fn compare(&self, first: &String, second: &String) -> Result<Winner, TestError> {
        if first == second {
            return Err(TestError::SelfComparison(first.clone()));
        }
        {
            let key = if first < second {
                (first.clone(), second.clone())
            } else {
                (second.clone(), first.clone())
            };
            if !self.seen.lock().unwrap().insert(key) {
                return Err(TestError::Repeated(first.clone(), second.clone()));
            }
            let mut log = self.log.lock().unwrap();
            log.push((first.clone(), second.clone()));
            if log.len() > self.max_calls {
                return Err(TestError::TooManyCalls(log.len()));
            }
        }
        self.inner.compare(first, second).await
    }
}
