//! Min-heap holding the next candidate entry of every live source.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    entry::Entry,
    observability::log_trace,
    source::SourceId,
    timestamp::Timestamp,
};

/// Priority queue over `(entry, source)` nodes, smallest timestamp first.
///
/// Equal timestamps are popped by ascending [`SourceId`]. Callers must not
/// rely on that tie-break beyond reproducibility.
#[derive(Debug)]
pub struct Frontier<P> {
    heap: BinaryHeap<CmpEntry<P>>,
}

impl<P> Frontier<P> {
    /// Empty frontier sized for `sources` sources.
    pub fn with_capacity(sources: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(sources),
        }
    }

    /// Insert the current candidate of `source_id`.
    pub fn push(&mut self, source_id: SourceId, entry: Entry<P>) {
        debug_assert!(
            self.heap.iter().all(|node| node.source_id != source_id),
            "{source_id} is already represented in the frontier"
        );
        log_trace!(
            component = "frontier",
            event = "frontier_push",
            source = %source_id,
            ts = %entry.ts(),
        );
        self.heap.push(CmpEntry { source_id, entry });
    }

    /// Remove the node with the smallest timestamp.
    pub fn pop(&mut self) -> Option<(SourceId, Entry<P>)> {
        self.heap.pop().map(|node| (node.source_id, node.entry))
    }

    /// Timestamp of the node [`Frontier::pop`] would return.
    pub fn peek_ts(&self) -> Option<Timestamp> {
        self.heap.peek().map(|node| node.entry.ts())
    }

    /// Number of represented sources.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no source is represented.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[derive(Debug)]
struct CmpEntry<P> {
    source_id: SourceId,
    entry: Entry<P>,
}

impl<P> PartialEq for CmpEntry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P> Eq for CmpEntry<P> {}

impl<P> PartialOrd for CmpEntry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for CmpEntry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap.
        self.entry
            .ts()
            .cmp(&other.entry.ts())
            .then(self.source_id.cmp(&other.source_id))
            .reverse()
    }
}
