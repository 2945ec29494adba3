//! Common test utilities for integration tests.
#![allow(dead_code)]

use std::{
    fmt,
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
};

use logmerge::{AsyncSource, Entry, IterSource, MemorySource};

/// Payload recording where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub source: usize,
    pub seq: usize,
}

/// Build entries with `Origin` payloads for the given timestamps.
pub fn entries(source: usize, timestamps: &[u64]) -> Vec<Entry<Origin>> {
    timestamps
        .iter()
        .enumerate()
        .map(|(seq, ts)| Entry::at(*ts, Origin { source, seq }))
        .collect()
}

pub fn memory(source: usize, timestamps: &[u64]) -> MemorySource<Origin> {
    MemorySource::new(entries(source, timestamps))
}

pub fn iter(source: usize, timestamps: &[u64]) -> IterSource<std::vec::IntoIter<Entry<Origin>>> {
    entries(source, timestamps).into_iter().collect()
}

/// Random non-decreasing timestamps for `sources` sources, ties included.
pub fn random_timestamps(rng: &mut fastrand::Rng, sources: usize, max_len: usize) -> Vec<Vec<u64>> {
    (0..sources)
        .map(|_| {
            let len = rng.usize(0..=max_len);
            let mut ts = rng.u64(0..20);
            (0..len)
                .map(|_| {
                    ts += rng.u64(0..5);
                    ts
                })
                .collect()
        })
        .collect()
}

/// Assert the ordering, per-source preservation and completeness properties.
pub fn assert_merged(inputs: &[Vec<u64>], merged: &[Entry<Origin>]) {
    let total: usize = inputs.iter().map(Vec::len).sum();
    assert_eq!(merged.len(), total, "every entry must be emitted exactly once");
    assert!(
        merged.windows(2).all(|pair| pair[0].ts() <= pair[1].ts()),
        "merged output must be sorted by timestamp"
    );
    for (source, timestamps) in inputs.iter().enumerate() {
        let seen: Vec<_> = merged
            .iter()
            .filter(|entry| entry.payload().source == source)
            .map(|entry| (entry.payload().seq, entry.ts().get()))
            .collect();
        let expected: Vec<_> = timestamps.iter().copied().enumerate().collect();
        assert_eq!(seen, expected, "source {source} must keep its own order");
    }
}

#[derive(Debug)]
pub struct Unavailable;

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("source unavailable")
    }
}

impl std::error::Error for Unavailable {}

/// Serves `good` entries, then fails every pop.
pub struct Flaky {
    inner: MemorySource<Origin>,
    good: usize,
    served: AtomicUsize,
}

impl Flaky {
    pub fn new(source: usize, timestamps: &[u64], good: usize) -> Self {
        Self {
            inner: memory(source, timestamps),
            good,
            served: AtomicUsize::new(0),
        }
    }
}

impl AsyncSource for Flaky {
    type Payload = Origin;
    type Error = Unavailable;

    fn pop(&self) -> impl Future<Output = Result<Option<Entry<Origin>>, Unavailable>> {
        let ok = self.served.fetch_add(1, Ordering::AcqRel) < self.good;
        let next = self.inner.pop();
        async move {
            if !ok {
                return Err(Unavailable);
            }
            Ok(next.await.unwrap_or_else(|never| match never {}))
        }
    }
}
