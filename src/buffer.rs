//! Per-source prefetch buffers for the batched merge.
//!
//! Each source owns a bounded queue of entries fetched ahead of consumption.
//! A source is queried again only when its queue is empty and it has never
//! reported exhaustion; the next entry of a source lives either at the head of
//! its queue or in the frontier, never in both.

use std::collections::VecDeque;

use futures_util::future::try_join_all;

use crate::{
    entry::Entry,
    error::MergeError,
    frontier::Frontier,
    observability::{log_debug, log_trace},
    option::MergeOptions,
    source::{AsyncSource, SourceId},
};

struct Slot<S>
where
    S: AsyncSource,
{
    source: S,
    buffer: VecDeque<Entry<S::Payload>>,
    exhausted: bool,
}

impl<S> Slot<S>
where
    S: AsyncSource,
{
    /// Pop up to `limit` entries one after another, stopping at exhaustion.
    async fn fill_serial(&mut self, source_id: SourceId, limit: usize) -> Result<usize, MergeError> {
        let mut pops = 0;
        while pops < limit && !self.exhausted {
            pops += 1;
            match self
                .source
                .pop()
                .await
                .map_err(|err| MergeError::from_source(source_id, err))?
            {
                Some(entry) => self.buffer.push_back(entry),
                None => self.exhausted = true,
            }
        }
        Ok(pops)
    }

    /// Issue `limit` pops at once and keep every entry that came back.
    async fn fill_concurrent(
        &mut self,
        source_id: SourceId,
        limit: usize,
    ) -> Result<usize, MergeError> {
        let source = &self.source;
        let results = try_join_all((0..limit).map(|_| source.pop()))
            .await
            .map_err(|err| MergeError::from_source(source_id, err))?;
        for result in results {
            match result {
                Some(entry) => self.buffer.push_back(entry),
                None => self.exhausted = true,
            }
        }
        Ok(limit)
    }
}

/// Arena of sources and their prefetch buffers, indexed by [`SourceId`].
pub(crate) struct BufferManager<S>
where
    S: AsyncSource,
{
    slots: Vec<Slot<S>>,
    batch_size: usize,
    concurrent_refill: bool,
    pops: usize,
    refills: usize,
}

impl<S> BufferManager<S>
where
    S: AsyncSource,
{
    pub(crate) fn new(sources: Vec<S>, options: &MergeOptions) -> Self {
        let slots = sources
            .into_iter()
            .map(|source| Slot {
                source,
                buffer: VecDeque::with_capacity(options.batch_size),
                exhausted: false,
            })
            .collect();
        Self {
            slots,
            batch_size: options.batch_size,
            concurrent_refill: options.concurrent_refill,
            pops: 0,
            refills: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Pops issued so far.
    pub(crate) fn pops(&self) -> usize {
        self.pops
    }

    /// Refill rounds issued after initialization.
    pub(crate) fn refills(&self) -> usize {
        self.refills
    }

    /// Entries currently held ahead of the frontier for `source_id`.
    pub(crate) fn buffered(&self, source_id: SourceId) -> usize {
        self.slots[source_id.index()].buffer.len()
    }

    pub(crate) fn into_sources(self) -> Vec<S> {
        self.slots.into_iter().map(|slot| slot.source).collect()
    }

    /// Fill every buffer with up to `batch_size` entries.
    ///
    /// Sources are filled concurrently; pops against one source are
    /// sequential so cursor-driven sources see them in order.
    pub(crate) async fn fill_all(&mut self) -> Result<(), MergeError> {
        let batch_size = self.batch_size;
        let pops = try_join_all(
            self.slots
                .iter_mut()
                .enumerate()
                .map(|(index, slot)| slot.fill_serial(SourceId::new(index), batch_size)),
        )
        .await?;
        self.pops += pops.into_iter().sum::<usize>();
        Ok(())
    }

    /// Move the head of every non-empty buffer into `frontier`.
    pub(crate) fn seed(&mut self, frontier: &mut Frontier<S::Payload>) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let source_id = SourceId::new(index);
            match slot.buffer.pop_front() {
                Some(head) => frontier.push(source_id, head),
                None => log_debug!(
                    component = "buffer",
                    event = "source_retired",
                    source = %source_id,
                    reason = "empty_at_start",
                ),
            }
        }
    }

    /// Next entry of `source_id` after its frontier entry was consumed.
    ///
    /// Serves from the buffer when possible, otherwise fetches a new batch.
    /// `None` retires the source for good.
    pub(crate) async fn next_for(
        &mut self,
        source_id: SourceId,
    ) -> Result<Option<Entry<S::Payload>>, MergeError> {
        let slot = &mut self.slots[source_id.index()];
        if let Some(entry) = slot.buffer.pop_front() {
            return Ok(Some(entry));
        }
        if slot.exhausted {
            log_debug!(
                component = "buffer",
                event = "source_retired",
                source = %source_id,
                reason = "exhausted",
            );
            return Ok(None);
        }

        let concurrent = self.concurrent_refill && slot.source.concurrent();
        self.refills += 1;
        log_trace!(
            component = "buffer",
            event = "refill_issued",
            source = %source_id,
            batch_size = self.batch_size,
            concurrent,
        );
        let pops = if concurrent {
            slot.fill_concurrent(source_id, self.batch_size).await?
        } else {
            slot.fill_serial(source_id, self.batch_size).await?
        };
        self.pops += pops;

        let next = slot.buffer.pop_front();
        if next.is_none() {
            log_debug!(
                component = "buffer",
                event = "source_retired",
                source = %source_id,
                reason = "empty_refill",
            );
        }
        Ok(next)
    }
}
