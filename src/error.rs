use std::error::Error as StdError;

use thiserror::Error;

use crate::source::SourceId;

/// Boxed failure raised by a source.
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that abort a merge.
///
/// Exhaustion of a source is never an error. Entries emitted before the
/// failure stay with the sink; completion is not signaled.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A source failed to produce its next entry.
    #[error("{source_id} failed to produce an entry: {source}")]
    Source {
        /// Handle of the failing source.
        source_id: SourceId,
        /// Failure reported by the source.
        #[source]
        source: BoxedError,
    },
    /// Merge options were rejected before any source was touched.
    #[error("invalid merge option: {0}")]
    InvalidOption(&'static str),
}

impl MergeError {
    pub(crate) fn from_source<E>(source_id: SourceId, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        MergeError::Source {
            source_id,
            source: Box::new(error),
        }
    }

    /// Handle of the failing source, if the error came from one.
    pub fn source_id(&self) -> Option<SourceId> {
        match self {
            MergeError::Source { source_id, .. } => Some(*source_id),
            MergeError::InvalidOption(_) => None,
        }
    }
}
