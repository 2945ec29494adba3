use async_lock::Mutex;

use super::{AsyncSource, Source};
use crate::entry::Entry;

/// Exposes a cursor-style [`Source`] as an [`AsyncSource`].
///
/// Pops are serialized behind an async mutex and the source reports itself as
/// non-concurrent, so batch refills against it run one pop at a time.
#[derive(Debug)]
pub struct Locked<S> {
    inner: Mutex<S>,
}

impl<S> Locked<S> {
    /// Wrap `source`.
    pub fn new(source: S) -> Self {
        Self {
            inner: Mutex::new(source),
        }
    }

    /// Unwrap the source.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

impl<S> AsyncSource for Locked<S>
where
    S: Source,
{
    type Payload = S::Payload;
    type Error = S::Error;

    async fn pop(&self) -> Result<Option<Entry<S::Payload>>, S::Error> {
        self.inner.lock().await.pop()
    }
}
