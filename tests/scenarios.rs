mod common;

use std::time::Duration;

use common::{entries, iter, memory, Flaky, Origin};
use logmerge::{
    async_sorted_merge, batched_sorted_merge, sync_sorted_merge, AsyncMerge, BatchedMerge, Entry,
    IterSource, Locked, MemorySource, MergeError, MergeOptions, MergeState, Printer, VecSink,
};

#[test]
fn sync_three_sources_interleave() {
    let mut sink = VecSink::default();
    let stats = sync_sorted_merge(
        vec![iter(0, &[1, 4, 7]), iter(1, &[2, 3]), iter(2, &[5, 6])],
        &mut sink,
    )
    .expect("merge");

    assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(sink.completions(), 1);
    assert_eq!(stats.emitted, 7);
    assert_eq!(sink.stats(), Some(&stats));
}

#[tokio::test]
async fn async_three_sources_interleave() {
    let mut sink = VecSink::default();
    async_sorted_merge(
        vec![memory(0, &[1, 4, 7]), memory(1, &[2, 3]), memory(2, &[5, 6])],
        &mut sink,
    )
    .await
    .expect("merge");

    assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(sink.completions(), 1);
}

#[tokio::test]
async fn batched_three_sources_interleave() {
    let options = MergeOptions::default().batch_size(2);
    let mut sink = VecSink::default();
    let stats = batched_sorted_merge(
        vec![memory(0, &[1, 4, 7]), memory(1, &[2, 3]), memory(2, &[5, 6])],
        &mut sink,
        &options,
    )
    .await
    .expect("merge");

    assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(sink.completions(), 1);
    assert_eq!(stats.sources, 3);
}

#[tokio::test]
async fn single_source_keeps_its_order() {
    let mut sink = VecSink::default();
    sync_sorted_merge(vec![iter(0, &[1, 2, 3])], &mut sink).expect("sync");
    assert_eq!(sink.timestamps(), vec![1, 2, 3]);
    assert_eq!(sink.completions(), 1);

    let mut sink = VecSink::default();
    let options = MergeOptions::default().batch_size(2);
    batched_sorted_merge(vec![memory(0, &[1, 2, 3])], &mut sink, &options)
        .await
        .expect("batched");
    assert_eq!(sink.timestamps(), vec![1, 2, 3]);
    assert_eq!(sink.completions(), 1);
}

#[tokio::test]
async fn empty_inputs_complete_once_without_emissions() {
    let mut sink = VecSink::<Origin>::default();
    let none: Vec<IterSource<std::vec::IntoIter<Entry<Origin>>>> = Vec::new();
    let stats = sync_sorted_merge(none, &mut sink).expect("sync");
    assert!(sink.entries().is_empty());
    assert_eq!(sink.completions(), 1);
    assert_eq!(stats.sources, 0);

    let mut sink = VecSink::<Origin>::default();
    async_sorted_merge(Vec::<MemorySource<Origin>>::new(), &mut sink)
        .await
        .expect("async");
    assert!(sink.entries().is_empty());
    assert_eq!(sink.completions(), 1);

    let mut sink = VecSink::default();
    batched_sorted_merge(
        vec![memory(0, &[]), memory(1, &[])],
        &mut sink,
        &MergeOptions::default(),
    )
    .await
    .expect("batched");
    assert!(sink.entries().is_empty());
    assert_eq!(sink.completions(), 1);
}

#[tokio::test]
async fn batch_boundary_exhaustion_is_never_requeried() {
    let sources = [
        memory(0, &[1, 4, 7, 9]),
        memory(1, &[2, 3, 8]),
        // One entry, then empty on the second pop of the first batch.
        memory(2, &[5]),
    ];
    let options = MergeOptions::default().batch_size(2);
    let mut merge = BatchedMerge::new(sources.iter(), &options).expect("options");

    let mut merged = Vec::new();
    while let Some(entry) = merge.next_entry().await.expect("merge") {
        merged.push((entry.ts().get(), entry.payload().source));
    }

    assert_eq!(
        merged,
        vec![
            (1, 0),
            (2, 1),
            (3, 1),
            (4, 0),
            (5, 2),
            (7, 0),
            (8, 1),
            (9, 0)
        ]
    );
    assert_eq!(merge.state(), MergeState::Done);
    assert_eq!(sources[2].pops(), 2);
}

#[tokio::test]
async fn concurrent_refill_tolerates_out_of_order_completion() {
    let latency = (Duration::from_millis(0), Duration::from_millis(3));
    let inputs: Vec<Vec<u64>> = vec![
        (0..40).map(|i| i * 3).collect(),
        (0..25).map(|i| i * 5 + 1).collect(),
        vec![2, 2, 2, 60],
    ];
    let sources: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(source, ts)| memory(source, ts).with_latency(latency.0, latency.1))
        .collect();

    let options = MergeOptions::default().batch_size(4);
    let mut sink = VecSink::default();
    let stats = batched_sorted_merge(sources, &mut sink, &options)
        .await
        .expect("merge");

    common::assert_merged(&inputs, sink.entries());
    assert!(stats.refills > 0);
}

#[tokio::test]
async fn locked_sources_are_refilled_serially() {
    let inputs = [vec![1, 3, 5, 7, 9], vec![2, 4, 6]];
    let sources: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(source, ts)| Locked::new(iter(source, ts)))
        .collect();

    let options = MergeOptions::default().batch_size(2);
    let mut sink = VecSink::default();
    let stats = batched_sorted_merge(sources, &mut sink, &options)
        .await
        .expect("merge");

    assert_eq!(sink.timestamps(), vec![1, 2, 3, 4, 5, 6, 7, 9]);
    // Serial refills stop at the first exhaustion: one pop per entry plus one
    // exhaustion signal per source.
    assert_eq!(stats.pops, 10);
}

#[tokio::test]
async fn source_failure_aborts_with_valid_prefix() {
    let sources = vec![
        Flaky::new(0, &[1, 3, 5, 7], 2),
        Flaky::new(1, &[2, 4, 6, 8], usize::MAX),
    ];
    let mut sink = VecSink::default();
    let err = AsyncMerge::new(sources)
        .run(&mut sink)
        .await
        .expect_err("source 0 fails on its third pop");

    assert!(matches!(err, MergeError::Source { .. }));
    assert_eq!(err.source_id().map(|id| id.index()), Some(0));
    assert_eq!(sink.timestamps(), vec![1, 2, 3]);
    assert_eq!(sink.completions(), 0);
}

#[tokio::test]
async fn batched_failure_during_initialization_emits_nothing() {
    let sources = vec![
        Flaky::new(0, &[1, 3, 5, 7], 1),
        Flaky::new(1, &[2, 4], usize::MAX),
    ];
    let options = MergeOptions::default().batch_size(3);
    let mut sink = VecSink::default();
    let err = batched_sorted_merge(sources, &mut sink, &options)
        .await
        .expect_err("source 0 fails inside its first batch");

    assert_eq!(err.source_id().map(|id| id.index()), Some(0));
    assert!(sink.entries().is_empty());
    assert_eq!(sink.completions(), 0);
}

#[tokio::test]
async fn printer_receives_merged_lines() {
    let sources = vec![
        MemorySource::new(entries(0, &[10, 30]).into_iter().map(|e| e.map(|_| "a")).collect()),
        MemorySource::new(entries(1, &[20]).into_iter().map(|e| e.map(|_| "b")).collect()),
    ];
    let mut printer = Printer::new(Vec::new());
    async_sorted_merge(sources, &mut printer)
        .await
        .expect("merge");

    assert_eq!(printer.out_of_order(), 0);
    let out = String::from_utf8(printer.finish().expect("write")).expect("utf8");
    assert!(out.starts_with("10 a\n20 b\n30 a\n"));
    assert!(out.contains("entries printed:\t3"));
}
