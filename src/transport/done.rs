//! Completion handle handed to every transform and flush invocation.

use std::fmt;
use std::rc::Weak;

use crate::error::StreamError;

use super::stream::{Shared, TransformStream};

/// Completion signal for one unit (or for the flush).
///
/// Consuming `self` makes a second call impossible. Dropping a `Done`
/// without calling it leaves the stream waiting: no later unit is
/// processed and flush never runs.
///
/// # Example
///
/// ```
/// use streamss_through::{through, Chunk, Transform};
///
/// let stream = through(Transform::with_done(|this, chunk, _enc, done| {
///     this.push(chunk);
///     done.ok();
/// }));
/// stream.write("x");
/// assert_eq!(stream.read(), Some(Chunk::from(&b"x"[..])));
/// ```
pub struct Done {
    stream: Weak<Shared>,
    seq: u64,
}

impl Done {
    pub(crate) fn new(stream: Weak<Shared>, seq: u64) -> Self {
        Self { stream, seq }
    }

    /// Signals completion, failing with `error` if one is given.
    pub fn call(self, error: Option<StreamError>) {
        if let Some(shared) = self.stream.upgrade() {
            TransformStream::from_shared(shared).complete(self.seq, error);
        }
    }

    /// Signals successful completion.
    pub fn ok(self) {
        self.call(None)
    }

    /// Signals completion with an error.
    pub fn err(self, error: StreamError) {
        self.call(Some(error))
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").field("seq", &self.seq).finish()
    }
}
