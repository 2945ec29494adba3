use std::{
    convert::Infallible,
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
};
#[cfg(feature = "tokio")]
use std::time::Duration;

use super::AsyncSource;
use crate::entry::Entry;

/// Vector-backed asynchronous source.
///
/// Every pop reserves its slot on an atomic cursor at call time, before the
/// returned future is first polled, so concurrent pops resolve in call order.
/// With the `tokio` feature a random per-pop delay can be configured to stand
/// in for I/O latency.
#[derive(Debug)]
pub struct MemorySource<P> {
    entries: Vec<Entry<P>>,
    cursor: AtomicUsize,
    pops: AtomicUsize,
    #[cfg(feature = "tokio")]
    latency: Option<(Duration, Duration)>,
}

impl<P> MemorySource<P> {
    /// Build a source over `entries`, which must already be sorted by timestamp.
    pub fn new(entries: Vec<Entry<P>>) -> Self {
        debug_assert!(
            entries.windows(2).all(|pair| pair[0].ts() <= pair[1].ts()),
            "source entries must be sorted by timestamp"
        );
        Self {
            entries,
            cursor: AtomicUsize::new(0),
            pops: AtomicUsize::new(0),
            #[cfg(feature = "tokio")]
            latency: None,
        }
    }

    /// Delay every pop by a uniformly random duration in `min..=max`.
    #[cfg(feature = "tokio")]
    pub fn with_latency(self, min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            latency: Some((min, max)),
            ..self
        }
    }

    /// Number of pops issued against this source so far.
    pub fn pops(&self) -> usize {
        self.pops.load(Ordering::Acquire)
    }

    /// Number of entries not yet handed out.
    pub fn remaining(&self) -> usize {
        self.entries
            .len()
            .saturating_sub(self.cursor.load(Ordering::Acquire))
    }

    fn reserve(&self) -> usize {
        self.pops.fetch_add(1, Ordering::AcqRel);
        let len = self.entries.len();
        // Saturate at `len` so exhausted sources never wrap the cursor.
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                (cursor < len).then_some(cursor + 1)
            }) {
            Ok(slot) => slot,
            Err(_) => len,
        }
    }

    #[cfg(feature = "tokio")]
    async fn delay(&self) {
        if let Some((min, max)) = self.latency {
            let millis = fastrand::u64(min.as_millis() as u64..=max.as_millis() as u64);
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

impl<P> FromIterator<Entry<P>> for MemorySource<P> {
    fn from_iter<T: IntoIterator<Item = Entry<P>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<P> AsyncSource for MemorySource<P>
where
    P: Clone,
{
    type Payload = P;
    type Error = Infallible;

    fn pop(&self) -> impl Future<Output = Result<Option<Entry<P>>, Infallible>> {
        let slot = self.reserve();
        async move {
            #[cfg(feature = "tokio")]
            self.delay().await;
            Ok(self.entries.get(slot).cloned())
        }
    }

    fn concurrent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::future::join_all;

    use super::MemorySource;
    use crate::{entry::Entry, source::AsyncSource, timestamp::Timestamp};

    fn source(timestamps: &[u64]) -> MemorySource<u64> {
        timestamps.iter().map(|ts| Entry::at(*ts, *ts)).collect()
    }

    #[tokio::test]
    async fn pops_in_order_then_stays_exhausted() {
        let source = source(&[1, 2]);
        assert_eq!(source.pop().await.unwrap().unwrap().ts(), Timestamp::new(1));
        assert_eq!(source.pop().await.unwrap().unwrap().ts(), Timestamp::new(2));
        assert!(source.pop().await.unwrap().is_none());
        assert!(source.pop().await.unwrap().is_none());
        assert_eq!(source.pops(), 4);
        assert_eq!(source.remaining(), 0);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn concurrent_pops_resolve_in_call_order() {
        let source = source(&[1, 2, 3, 4, 5, 6])
            .with_latency(Duration::from_millis(0), Duration::from_millis(5));
        let results = join_all((0..8).map(|_| source.pop())).await;
        let timestamps: Vec<_> = results
            .into_iter()
            .map(|result| result.unwrap().map(|entry| entry.ts().get()))
            .collect();
        assert_eq!(
            timestamps,
            vec![
                Some(1),
                Some(2),
                Some(3),
                Some(4),
                Some(5),
                Some(6),
                None,
                None
            ]
        );
        assert!(source.concurrent());
    }
}
