#![deny(missing_docs)]
//! Chronological merge of independently ordered log sources.
//!
//! Every source yields timestamped entries in non-decreasing order; sources are
//! not synchronized with each other. The merge keeps one candidate per live
//! source in a min-heap frontier and hands entries to a [`Sink`] in global
//! timestamp order, preserving each source's own order.
//!
//! Three drivers share that shape:
//!
//! - [`SyncMerge`] for sources whose pops return immediately,
//! - [`AsyncMerge`] for suspending sources, one outstanding pop at a time,
//! - [`BatchedMerge`] for slow suspending sources, prefetching up to
//!   [`MergeOptions::batch_size`] entries per source.
//!
//! ```rust
//! use logmerge::{sync_sorted_merge, Entry, IterSource, VecSink};
//!
//! let a: IterSource<_> = [1, 4, 7].map(|ts| Entry::at(ts, "a")).into_iter().collect();
//! let b: IterSource<_> = [2, 3].map(|ts| Entry::at(ts, "b")).into_iter().collect();
//!
//! let mut sink = VecSink::default();
//! sync_sorted_merge([a, b], &mut sink).unwrap();
//! assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 7]);
//! assert_eq!(sink.completions(), 1);
//! ```

mod buffer;
mod error;
mod observability;

/// Timestamped records.
pub mod entry;
/// Min-heap over the next entry of every live source.
pub mod frontier;
/// Merge drivers and one-call entry points.
pub mod merge;
/// Tuning knobs for the batched merge.
pub mod option;
/// Consumers of the merged sequence.
pub mod sink;
/// Provider contracts and ready-made sources.
pub mod source;
/// Totally ordered instants.
pub mod timestamp;

pub mod prelude;

pub use crate::{
    entry::{Entry, Level, LogRecord},
    error::{BoxedError, MergeError},
    frontier::Frontier,
    merge::{
        async_sorted_merge, batched_sorted_merge, sync_sorted_merge, AsyncMerge, BatchedMerge,
        MergeState, MergeStats, SyncMerge,
    },
    option::MergeOptions,
    sink::{Printer, Sink, VecSink},
    source::{AsyncSource, IterSource, Locked, MemorySource, Source, SourceId},
    timestamp::Timestamp,
};
