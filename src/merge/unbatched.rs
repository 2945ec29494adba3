use futures_core::Stream;
use futures_util::future::try_join_all;

use super::{Drain, MergeState, MergeStats};
use crate::{
    entry::Entry,
    error::MergeError,
    observability::log_debug,
    sink::Sink,
    source::{AsyncSource, SourceId},
};

/// Merge over suspending sources with one fetch per consumed entry.
///
/// Initialization pops the head of every source concurrently; while draining,
/// exactly one pop is outstanding at a time.
pub struct AsyncMerge<S>
where
    S: AsyncSource,
{
    sources: Vec<S>,
    drain: Drain<S::Payload>,
}

impl<S> AsyncMerge<S>
where
    S: AsyncSource,
{
    /// Prepare a merge; no source is queried until the first step.
    pub fn new(sources: impl IntoIterator<Item = S>) -> Self {
        let sources: Vec<S> = sources.into_iter().collect();
        let drain = Drain::new("async", sources.len());
        Self { sources, drain }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MergeState {
        self.drain.state()
    }

    /// Counters so far.
    pub fn stats(&self) -> MergeStats {
        self.drain.stats()
    }

    /// Return the sources, e.g. to inspect them after draining.
    pub fn into_sources(self) -> Vec<S> {
        self.sources
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
        let stats = self.drain.stats();
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
            MergeState::Initializing => self.initialize().await?,
            MergeState::Draining => {
                if let Some(source_id) = self.drain.take_pending() {
                    self.drain.add_pops(1);
                    let next = self.sources[source_id.index()]
                        .pop()
                        .await
                        .map_err(|err| MergeError::from_source(source_id, err))?;
                    if next.is_none() {
                        log_debug!(
                            component = "merge",
                            event = "source_exhausted",
                            source = %source_id,
                        );
                    }
                    self.drain.replenish(source_id, next);
                }
            }
            MergeState::Done => return Ok(None),
        }
        Ok(self.drain.pop_min())
    }

    async fn initialize(&mut self) -> Result<(), MergeError> {
        self.drain.begin(None);
        let heads = try_join_all(self.sources.iter().enumerate().map(|(index, source)| {
            let source_id = SourceId::new(index);
            async move {
                let head = source
                    .pop()
                    .await
                    .map_err(|err| MergeError::from_source(source_id, err))?;
                Ok::<_, MergeError>((source_id, head))
            }
        }))
        .await?;
        self.drain.add_pops(heads.len());
        for (source_id, head) in heads {
            self.drain.replenish(source_id, head);
        }
        self.drain.start_draining();
        Ok(())
    }
}
