use futures_core::Stream;

use super::{Drain, MergeState, MergeStats};
use crate::{
    buffer::BufferManager,
    entry::Entry,
    error::MergeError,
    option::MergeOptions,
    sink::Sink,
    source::{AsyncSource, SourceId},
};

/// Merge over suspending sources that prefetches a bounded batch per source.
///
/// At most `batch_size` entries per source are held ahead of consumption. A
/// source is fetched again only once its buffer runs dry, and never after it
/// has reported exhaustion.
pub struct BatchedMerge<S>
where
    S: AsyncSource,
{
    buffers: BufferManager<S>,
    drain: Drain<S::Payload>,
    batch_size: usize,
}

impl<S> BatchedMerge<S>
where
    S: AsyncSource,
{
    /// Prepare a merge; no source is queried until the first step.
    pub fn new(
        sources: impl IntoIterator<Item = S>,
        options: &MergeOptions,
    ) -> Result<Self, MergeError> {
        options.validate()?;
        let buffers = BufferManager::new(sources.into_iter().collect(), options);
        let drain = Drain::new("batched", buffers.len());
        Ok(Self {
            buffers,
            drain,
            batch_size: options.batch_size,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MergeState {
        self.drain.state()
    }

    /// Counters so far.
    pub fn stats(&self) -> MergeStats {
        self.drain.stats()
    }

    /// Entries prefetched for `source_id` and not yet in the frontier.
    pub fn buffered(&self, source_id: SourceId) -> usize {
        self.buffers.buffered(source_id)
    }

    /// Return the sources, e.g. to inspect them after draining.
    pub fn into_sources(self) -> Vec<S> {
        self.buffers.into_sources()
    }

    /// Produce the next entry in merged order, or `None` once every source
    /// is exhausted.
    pub async fn next_entry(&mut self) -> Result<Option<Entry<S::Payload>>, MergeError> {
        match self.step().await {
            Ok(entry) => Ok(entry),
            Err(err) => {
                self.drain.fail(&err);
                Err(err)
            }
        }
    }

    /// Drain every entry into `sink`, then complete it.
    pub async fn run<K>(mut self, sink: &mut K) -> Result<MergeStats, MergeError>
    where
        K: Sink<S::Payload> + ?Sized,
    {
        while let Some(entry) = self.next_entry().await? {
            sink.emit(entry);
        }
        let stats = self.stats();
        sink.complete(&stats);
        Ok(stats)
    }

    /// Consume the merge as a stream of entries in merged order.
    pub fn into_stream(self) -> impl Stream<Item = Result<Entry<S::Payload>, MergeError>> {
        let mut merge = self;
        async_stream::try_stream! {
            while let Some(entry) = merge.next_entry().await? {
                yield entry;
            }
        }
    }

    async fn step(&mut self) -> Result<Option<Entry<S::Payload>>, MergeError> {
        match self.drain.state() {
            MergeState::Initializing => {
                self.drain.begin(Some(self.batch_size));
                self.buffers.fill_all().await?;
                self.buffers.seed(self.drain.frontier_mut());
                self.drain.start_draining();
            }
            MergeState::Draining => {
                if let Some(source_id) = self.drain.take_pending() {
                    let next = self.buffers.next_for(source_id).await?;
                    self.drain.replenish(source_id, next);
                }
            }
            MergeState::Done => return Ok(None),
        }
        self.drain.record_io(self.buffers.pops(), self.buffers.refills());
        Ok(self.drain.pop_min())
    }
}

#[cfg(test)]
mod tests {
    use super::BatchedMerge;
    use crate::{
        entry::Entry,
        error::MergeError,
        merge::MergeState,
        option::MergeOptions,
        sink::VecSink,
        source::{MemorySource, SourceId},
    };

    fn memory(timestamps: &[u64]) -> MemorySource<u64> {
        timestamps.iter().map(|ts| Entry::at(*ts, *ts)).collect()
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let options = MergeOptions::default().batch_size(0);
        let err = BatchedMerge::new(vec![memory(&[1])], &options)
            .err()
            .expect("zero batch size must be rejected");
        assert!(matches!(err, MergeError::InvalidOption(_)));
    }

    #[tokio::test]
    async fn buffers_never_exceed_batch_size() {
        let options = MergeOptions::default().batch_size(3);
        let timestamps: Vec<u64> = (0..20).collect();
        let mut merge =
            BatchedMerge::new(vec![memory(&timestamps), memory(&[5, 10])], &options).unwrap();

        let mut emitted = Vec::new();
        while let Some(entry) = merge.next_entry().await.unwrap() {
            assert!(merge.buffered(SourceId::new(0)) < 3);
            assert!(merge.buffered(SourceId::new(1)) < 3);
            emitted.push(entry.ts().get());
        }
        assert_eq!(merge.state(), MergeState::Done);
        assert_eq!(emitted.len(), 22);
        assert!(emitted.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn counters_track_refills() {
        let options = MergeOptions::default().batch_size(2);
        let mut sink = VecSink::default();
        let stats = BatchedMerge::new(vec![memory(&[1, 2, 3, 4, 5])], &options)
            .unwrap()
            .run(&mut sink)
            .await
            .unwrap();

        assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 5]);
        // Initial {1, 2}, then refills {3, 4} and {5, none}.
        assert_eq!(stats.refills, 2);
        assert_eq!(stats.pops, 6);
        assert_eq!(stats.emitted, 5);
    }
}
