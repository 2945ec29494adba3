use super::{Drain, MergeState, MergeStats};
use crate::{
    entry::Entry,
    error::MergeError,
    observability::log_debug,
    sink::Sink,
    source::{Source, SourceId},
};

/// Heap-driven merge over sources whose pops return immediately.
///
/// Also usable as an iterator of `Result<Entry, MergeError>`; the iterator is
/// fused after exhaustion or the first error.
pub struct SyncMerge<S>
where
    S: Source,
{
    sources: Vec<S>,
    drain: Drain<S::Payload>,
}

impl<S> SyncMerge<S>
where
    S: Source,
{
    /// Prepare a merge; no source is queried until the first step.
    pub fn new(sources: impl IntoIterator<Item = S>) -> Self {
        let sources: Vec<S> = sources.into_iter().collect();
        let drain = Drain::new("sync", sources.len());
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
    pub fn next_entry(&mut self) -> Result<Option<Entry<S::Payload>>, MergeError> {
        match self.step() {
            Ok(entry) => Ok(entry),
            Err(err) => {
                self.drain.fail(&err);
                Err(err)
            }
        }
    }

    /// Drain every entry into `sink`, then complete it.
    pub fn run<K>(mut self, sink: &mut K) -> Result<MergeStats, MergeError>
    where
        K: Sink<S::Payload> + ?Sized,
    {
        while let Some(entry) = self.next_entry()? {
            sink.emit(entry);
        }
        let stats = self.drain.stats();
        sink.complete(&stats);
        Ok(stats)
    }

    fn step(&mut self) -> Result<Option<Entry<S::Payload>>, MergeError> {
        match self.drain.state() {
            MergeState::Initializing => self.initialize()?,
            MergeState::Draining => {
                if let Some(source_id) = self.drain.take_pending() {
                    let next = self.pop_source(source_id)?;
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

    fn initialize(&mut self) -> Result<(), MergeError> {
        self.drain.begin(None);
        for index in 0..self.sources.len() {
            let source_id = SourceId::new(index);
            let head = self.pop_source(source_id)?;
            self.drain.replenish(source_id, head);
        }
        self.drain.start_draining();
        Ok(())
    }

    fn pop_source(
        &mut self,
        source_id: SourceId,
    ) -> Result<Option<Entry<S::Payload>>, MergeError> {
        self.drain.add_pops(1);
        self.sources[source_id.index()]
            .pop()
            .map_err(|err| MergeError::from_source(source_id, err))
    }
}

impl<S> Iterator for SyncMerge<S>
where
    S: Source,
{
    type Item = Result<Entry<S::Payload>, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
