use crate::error::MergeError;

/// Default number of entries prefetched per source by the batched merge.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Tuning knobs for [`BatchedMerge`](crate::merge::BatchedMerge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub(crate) batch_size: usize,
    pub(crate) concurrent_refill: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrent_refill: true,
        }
    }
}

impl MergeOptions {
    /// Maximum number of entries fetched ahead of consumption for one source.
    ///
    /// Bounds buffered memory to `batch_size` entries per source.
    pub fn batch_size(self, batch_size: usize) -> Self {
        MergeOptions { batch_size, ..self }
    }

    /// Issue refill fetches concurrently against sources that support it.
    ///
    /// Sources reporting `concurrent() == false` are always refilled serially.
    pub fn concurrent_refill(self, concurrent_refill: bool) -> Self {
        MergeOptions {
            concurrent_refill,
            ..self
        }
    }

    /// Configured batch size.
    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether concurrent refills are allowed.
    pub fn get_concurrent_refill(&self) -> bool {
        self.concurrent_refill
    }

    pub(crate) fn validate(&self) -> Result<(), MergeError> {
        if self.batch_size == 0 {
            return Err(MergeError::InvalidOption("batch_size must be at least 1"));
        }
        Ok(())
    }
}
