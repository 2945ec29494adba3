//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logmerge::prelude::*;
//!
//! let sources = vec![MemorySource::from_iter(entries_a), MemorySource::from_iter(entries_b)];
//! let mut printer = Printer::new(std::io::stdout());
//! batched_sorted_merge(sources, &mut printer, &MergeOptions::default()).await?;
//! ```

pub use crate::{
    async_sorted_merge, batched_sorted_merge, sync_sorted_merge, AsyncSource, Entry, MergeError,
    MergeOptions, MergeStats, Printer, Sink, Source, Timestamp,
};
#[doc(no_inline)]
pub use crate::{IterSource, MemorySource, VecSink};
