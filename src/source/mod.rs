//! Provider contracts consumed by the merge engine.
//!
//! A source hands out its entries one at a time in non-decreasing timestamp
//! order and reports exhaustion with `Ok(None)`. Exhaustion is permanent: the
//! engine never asks a source again once it has seen `None` from it.

mod locked;
mod memory;

use std::{convert::Infallible, error::Error, fmt, future::Future, sync::Arc};

pub use locked::Locked;
pub use memory::MemorySource;

use crate::entry::Entry;

/// Stable handle of a source inside one merge, assigned by input position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(usize);

impl SourceId {
    /// Handle of the source at position `index`.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the source in the collection handed to the merge.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Source whose pops return immediately.
pub trait Source {
    /// Payload carried by every entry.
    type Payload;
    /// Failure raised by [`Source::pop`]; distinct from exhaustion.
    type Error: Error + Send + Sync + 'static;

    /// Take the next entry, or `None` once the source is exhausted.
    fn pop(&mut self) -> Result<Option<Entry<Self::Payload>>, Self::Error>;
}

/// Source whose pops suspend (network, disk).
///
/// `pop` takes `&self` so that the batched engine can keep several requests
/// in flight against one source. Implementations with cursor state must
/// reserve their position when `pop` is called, not when it resolves.
pub trait AsyncSource {
    /// Payload carried by every entry.
    type Payload;
    /// Failure raised by [`AsyncSource::pop`]; distinct from exhaustion.
    type Error: Error + Send + Sync + 'static;

    /// Take the next entry, or `None` once the source is exhausted.
    fn pop(&self) -> impl Future<Output = Result<Option<Entry<Self::Payload>>, Self::Error>>;

    /// Whether concurrently issued pops resolve to entries in call order.
    ///
    /// When `false`, batch refills against this source are serialized.
    fn concurrent(&self) -> bool {
        false
    }
}

impl<S> Source for &mut S
where
    S: Source + ?Sized,
{
    type Payload = S::Payload;
    type Error = S::Error;

    fn pop(&mut self) -> Result<Option<Entry<S::Payload>>, S::Error> {
        (**self).pop()
    }
}

impl<S> Source for Box<S>
where
    S: Source + ?Sized,
{
    type Payload = S::Payload;
    type Error = S::Error;

    fn pop(&mut self) -> Result<Option<Entry<S::Payload>>, S::Error> {
        (**self).pop()
    }
}

impl<S> AsyncSource for &S
where
    S: AsyncSource + ?Sized,
{
    type Payload = S::Payload;
    type Error = S::Error;

    fn pop(&self) -> impl Future<Output = Result<Option<Entry<S::Payload>>, S::Error>> {
        (**self).pop()
    }

    fn concurrent(&self) -> bool {
        (**self).concurrent()
    }
}

impl<S> AsyncSource for Arc<S>
where
    S: AsyncSource + ?Sized,
{
    type Payload = S::Payload;
    type Error = S::Error;

    fn pop(&self) -> impl Future<Output = Result<Option<Entry<S::Payload>>, S::Error>> {
        (**self).pop()
    }

    fn concurrent(&self) -> bool {
        (**self).concurrent()
    }
}

/// Adapts any iterator of entries into a [`Source`].
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    inner: I,
    done: bool,
}

impl<I> IterSource<I> {
    /// Wrap an iterator that yields entries in timestamp order.
    pub fn new(inner: I) -> Self {
        Self { inner, done: false }
    }
}

impl<I, P> Source for IterSource<I>
where
    I: Iterator<Item = Entry<P>>,
{
    type Payload = P;
    type Error = Infallible;

    fn pop(&mut self) -> Result<Option<Entry<P>>, Infallible> {
        if self.done {
            return Ok(None);
        }
        let next = self.inner.next();
        // Iterators are not required to be fused.
        self.done = next.is_none();
        Ok(next)
    }
}

impl<P> FromIterator<Entry<P>> for IterSource<std::vec::IntoIter<Entry<P>>> {
    fn from_iter<T: IntoIterator<Item = Entry<P>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>().into_iter())
    }
}
