//! Consumers of the merged sequence.

use std::{
    fmt,
    io::{self, Write},
};

use crate::{entry::Entry, merge::MergeStats, timestamp::Timestamp};

/// Receives entries in final merged order.
///
/// `emit` is called once per entry; `complete` exactly once after the last
/// emission, and never when the merge aborts on a source error.
pub trait Sink<P> {
    /// Accept the next entry in merged order.
    fn emit(&mut self, entry: Entry<P>);

    /// No further entries will follow.
    fn complete(&mut self, stats: &MergeStats);
}

impl<P, K> Sink<P> for &mut K
where
    K: Sink<P> + ?Sized,
{
    fn emit(&mut self, entry: Entry<P>) {
        (**self).emit(entry)
    }

    fn complete(&mut self, stats: &MergeStats) {
        (**self).complete(stats)
    }
}

/// Collects the merged sequence in memory.
#[derive(Debug, Clone)]
pub struct VecSink<P> {
    entries: Vec<Entry<P>>,
    completions: usize,
    stats: Option<MergeStats>,
}

impl<P> Default for VecSink<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            completions: 0,
            stats: None,
        }
    }
}

impl<P> VecSink<P> {
    /// Entries received so far.
    pub fn entries(&self) -> &[Entry<P>] {
        &self.entries
    }

    /// Timestamps received so far, as raw values.
    pub fn timestamps(&self) -> Vec<u64> {
        self.entries.iter().map(|entry| entry.ts().get()).collect()
    }

    /// Number of completion signals received.
    pub fn completions(&self) -> usize {
        self.completions
    }

    /// Counters handed over with the last completion.
    pub fn stats(&self) -> Option<&MergeStats> {
        self.stats.as_ref()
    }

    /// Take the collected entries.
    pub fn into_entries(self) -> Vec<Entry<P>> {
        self.entries
    }
}

impl<P> Sink<P> for VecSink<P> {
    fn emit(&mut self, entry: Entry<P>) {
        debug_assert_eq!(self.completions, 0, "entry emitted after completion");
        self.entries.push(entry);
    }

    fn complete(&mut self, stats: &MergeStats) {
        self.completions += 1;
        self.stats = Some(*stats);
    }
}

/// Writes one `<ts> <payload>` line per entry and a summary on completion.
///
/// Write failures are latched: after the first one nothing more is written,
/// and the error is returned by [`Printer::finish`].
#[derive(Debug)]
pub struct Printer<W> {
    writer: W,
    printed: usize,
    out_of_order: usize,
    last: Option<Timestamp>,
    error: Option<io::Error>,
}

impl<W> Printer<W>
where
    W: Write,
{
    /// Print to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            printed: 0,
            out_of_order: 0,
            last: None,
            error: None,
        }
    }

    /// Entries printed so far.
    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Entries whose timestamp was older than the one printed before them.
    pub fn out_of_order(&self) -> usize {
        self.out_of_order
    }

    /// Flush and return the writer, or the first write failure.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.writer.write_fmt(args) {
            self.error = Some(err);
        }
    }
}

impl<P, W> Sink<P> for Printer<W>
where
    P: fmt::Display,
    W: Write,
{
    fn emit(&mut self, entry: Entry<P>) {
        if self.last.is_some_and(|last| entry.ts() < last) {
            self.out_of_order += 1;
        }
        self.last = Some(entry.ts());
        self.printed += 1;
        self.write(format_args!("{entry}\n"));
    }

    fn complete(&mut self, stats: &MergeStats) {
        let printed = self.printed;
        let out_of_order = self.out_of_order;
        self.write(format_args!(
            "\n***********************************\n\
             entries printed:\t{printed}\n\
             sources merged:\t\t{}\n\
             time taken (s):\t\t{:.3}\n\
             entries/s:\t\t{:.1}\n\
             out of order:\t\t{out_of_order}\n\
             ***********************************\n",
            stats.sources,
            stats.elapsed.as_secs_f64(),
            stats.entries_per_sec(),
        ));
    }
}
