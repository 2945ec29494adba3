//! Merge drivers: frontier bookkeeping shared by the sync, async and batched
//! variants, plus the one-call entry points.

mod batched;
mod sync;
mod unbatched;

use std::time::{Duration, Instant};

pub use batched::BatchedMerge;
pub use sync::SyncMerge;
pub use unbatched::AsyncMerge;

use crate::{
    entry::Entry,
    error::MergeError,
    frontier::Frontier,
    observability::{log_info, log_warn},
    option::MergeOptions,
    sink::Sink,
    source::{AsyncSource, Source, SourceId},
};

/// Lifecycle of a merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeState {
    /// No source has been queried yet.
    #[default]
    Initializing,
    /// The frontier is being drained.
    Draining,
    /// Every source is exhausted, or the merge was aborted by a source error.
    Done,
}

/// Counters reported when a merge completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of sources handed to the merge.
    pub sources: usize,
    /// Entries emitted in merged order.
    pub emitted: usize,
    /// Pops issued against sources, including the ones that hit exhaustion.
    pub pops: usize,
    /// Batch refills issued (batched merge only).
    pub refills: usize,
    /// Wall time between the first pop and completion.
    pub elapsed: Duration,
}

impl MergeStats {
    /// Emitted entries per second of wall time.
    pub fn entries_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.emitted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Frontier plus the bookkeeping every driver needs between pops.
///
/// After an entry is handed out, its source is parked in `pending` and only
/// queried for a replacement on the following step, so an entry always
/// reaches the consumer before its successor is fetched.
#[derive(Debug)]
pub(crate) struct Drain<P> {
    frontier: Frontier<P>,
    state: MergeState,
    pending: Option<SourceId>,
    stats: MergeStats,
    started: Option<Instant>,
    mode: &'static str,
}

impl<P> Drain<P> {
    pub(crate) fn new(mode: &'static str, sources: usize) -> Self {
        Self {
            frontier: Frontier::with_capacity(sources),
            state: MergeState::Initializing,
            pending: None,
            stats: MergeStats {
                sources,
                ..MergeStats::default()
            },
            started: None,
            mode,
        }
    }

    pub(crate) fn state(&self) -> MergeState {
        self.state
    }

    /// Record the start of initialization.
    pub(crate) fn begin(&mut self, batch_size: Option<usize>) {
        self.started = Some(Instant::now());
        log_info!(
            component = "merge",
            event = "merge_started",
            mode = self.mode,
            sources = self.stats.sources,
            batch_size = ?batch_size,
        );
    }

    pub(crate) fn frontier_mut(&mut self) -> &mut Frontier<P> {
        &mut self.frontier
    }

    pub(crate) fn start_draining(&mut self) {
        self.state = MergeState::Draining;
    }

    pub(crate) fn take_pending(&mut self) -> Option<SourceId> {
        self.pending.take()
    }

    /// Re-insert the replacement fetched for `source_id`, if any.
    pub(crate) fn replenish(&mut self, source_id: SourceId, next: Option<Entry<P>>) {
        if let Some(next) = next {
            self.frontier.push(source_id, next);
        }
    }

    /// Pop the global minimum and park its source for replenishment.
    pub(crate) fn pop_min(&mut self) -> Option<Entry<P>> {
        match self.frontier.pop() {
            Some((source_id, entry)) => {
                self.pending = Some(source_id);
                self.stats.emitted += 1;
                Some(entry)
            }
            None => {
                self.finish();
                None
            }
        }
    }

    pub(crate) fn add_pops(&mut self, pops: usize) {
        self.stats.pops += pops;
    }

    /// Overwrite the I/O counters with totals kept by a buffer manager.
    pub(crate) fn record_io(&mut self, pops: usize, refills: usize) {
        self.stats.pops = pops;
        self.stats.refills = refills;
    }

    pub(crate) fn stats(&self) -> MergeStats {
        MergeStats {
            elapsed: self
                .started
                .map(|started| started.elapsed())
                .unwrap_or(self.stats.elapsed),
            ..self.stats
        }
    }

    /// Abort after a source failure; the merge yields nothing further.
    pub(crate) fn fail(&mut self, error: &MergeError) {
        self.state = MergeState::Done;
        self.pending = None;
        self.freeze_clock();
        log_warn!(
            component = "merge",
            event = "merge_aborted",
            mode = self.mode,
            emitted = self.stats.emitted,
            error = %error,
        );
    }

    fn freeze_clock(&mut self) {
        if let Some(started) = self.started.take() {
            self.stats.elapsed = started.elapsed();
        }
    }

    fn finish(&mut self) {
        if self.state == MergeState::Done {
            return;
        }
        self.state = MergeState::Done;
        self.freeze_clock();
        let stats = self.stats;
        log_info!(
            component = "merge",
            event = "merge_drained",
            mode = self.mode,
            emitted = stats.emitted,
            pops = stats.pops,
            refills = stats.refills,
            elapsed_ms = stats.elapsed.as_millis() as u64,
        );
    }
}

/// Merge immediate sources into `sink` and signal completion.
///
/// Returns the merge counters, or the first source error. On error the sink
/// keeps whatever was emitted and is not completed.
pub fn sync_sorted_merge<I, S, K>(sources: I, sink: &mut K) -> Result<MergeStats, MergeError>
where
    I: IntoIterator<Item = S>,
    S: Source,
    K: Sink<S::Payload> + ?Sized,
{
    SyncMerge::new(sources).run(sink)
}

/// Merge suspending sources into `sink`, one outstanding pop at a time.
pub async fn async_sorted_merge<I, S, K>(sources: I, sink: &mut K) -> Result<MergeStats, MergeError>
where
    I: IntoIterator<Item = S>,
    S: AsyncSource,
    K: Sink<S::Payload> + ?Sized,
{
    AsyncMerge::new(sources).run(sink).await
}

/// Merge suspending sources into `sink`, prefetching up to
/// `options.batch_size` entries per source.
pub async fn batched_sorted_merge<I, S, K>(
    sources: I,
    sink: &mut K,
    options: &MergeOptions,
) -> Result<MergeStats, MergeError>
where
    I: IntoIterator<Item = S>,
    S: AsyncSource,
    K: Sink<S::Payload> + ?Sized,
{
    BatchedMerge::new(sources, options)?.run(sink).await
}
