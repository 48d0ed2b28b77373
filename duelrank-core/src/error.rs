use thiserror::Error;

/// Failure of a ranking operation.
///
/// `E` is the comparator's own error type. A comparator failure aborts the
/// operation and is handed back as-is inside [`RankError::Comparator`].
#[derive(Debug, Error)]
pub enum RankError<E> {
    #[error("no duplicates allowed in items to be ranked ({count} repeated)")]
    DuplicateItems { count: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("comparator failed: {0}")]
    Comparator(#[source] E),
}

impl<E> RankError<E> {
    /// Unwrap the comparator error, if that is what this is.
    pub fn into_comparator_error(self) -> Option<E> {
        match self {
            RankError::Comparator(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E> = std::result::Result<T, RankError<E>>;
