//! The comparator capability and a few ready-made adapters.
//!
//! A comparator decides which of two items wins. It may be a person answering
//! prompts, a remote model, or a plain function, so every call is `async` and
//! may take arbitrarily long.
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::types::Winner;

/// Decides the winner of an ordered pair of distinct items.
///
/// The ranking operations never pass the same item twice in one call, and
/// within one exhaustive pass never ask about the same unordered pair twice.
/// Tie-breaking may call `compare` from several sub-rankings concurrently;
/// implementors backed by an exclusive resource must serialize internally.
#[async_trait]
pub trait Comparator<T: Sync>: Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn compare(&self, first: &T, second: &T) -> Result<Winner, Self::Error>;
}

#[async_trait]
impl<T: Sync, C: Comparator<T>> Comparator<T> for &C {
    type Error = C::Error;

    async fn compare(&self, first: &T, second: &T) -> Result<Winner, Self::Error> {
        (**self).compare(first, second).await
    }
}

/// Wraps a synchronous closure as a comparator.
pub struct FnComparator<F>(pub F);

#[async_trait]
impl<T, E, F> Comparator<T> for FnComparator<F>
where
    T: Sync,
    E: std::error::Error + Send + Sync + 'static,
    F: Fn(&T, &T) -> Result<Winner, E> + Sync,
{
    type Error = E;

    async fn compare(&self, first: &T, second: &T) -> Result<Winner, E> {
        (self.0)(first, second)
    }
}

/// Counts every call that reaches the wrapped comparator.
pub struct CountingComparator<C> {
    inner: C,
    calls: AtomicUsize,
}

impl<C> CountingComparator<C> {
    pub fn new(inner: C) -> Self {
        CountingComparator {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of comparisons issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<T: Sync, C: Comparator<T>> Comparator<T> for CountingComparator<C> {
    type Error = C::Error;

    async fn compare(&self, first: &T, second: &T) -> Result<Winner, Self::Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.compare(first, second).await
    }
}

/// A pending question for the decision-maker on the other end of a
/// [`ChannelComparator`]. Answer it with [`ComparisonRequest::respond`].
#[derive(Debug)]
pub struct ComparisonRequest<T> {
    pub first: T,
    pub second: T,
    reply: oneshot::Sender<Winner>,
}

impl<T> ComparisonRequest<T> {
    /// Send the decision back. Returns `false` if the asking side has gone away.
    pub fn respond(self, winner: Winner) -> bool {
        self.reply.send(winner).is_ok()
    }
}

/// The decision-maker stopped listening or dropped a request unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decision source closed before answering")]
pub struct ChannelClosed;

/// Forwards each comparison over a channel and waits for the reply.
///
/// Requests arrive in the order the ranking operation issues them, so a single
/// consumer sees the exact sequential order of exhaustive ranking and
/// merge-insertion sort.
pub struct ChannelComparator<T> {
    requests: mpsc::Sender<ComparisonRequest<T>>,
}

impl<T> Clone for ChannelComparator<T> {
    fn clone(&self) -> Self {
        ChannelComparator {
            requests: self.requests.clone(),
        }
    }
}

impl<T> ChannelComparator<T> {
    /// Create a comparator and the receiving end the decision-maker reads from.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ComparisonRequest<T>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (ChannelComparator { requests: tx }, rx)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Comparator<T> for ChannelComparator<T> {
    type Error = ChannelClosed;

    async fn compare(&self, first: &T, second: &T) -> Result<Winner, ChannelClosed> {
        let (reply, answer) = oneshot::channel();
        let request = ComparisonRequest {
            first: first.clone(),
            second: second.clone(),
            reply,
        };
        self.requests.send(request).await.map_err(|_| ChannelClosed)?;
        answer.await.map_err(|_| ChannelClosed)
    }
}
