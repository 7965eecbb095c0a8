//! Transform and flush callbacks, and their adaptation to the transport.
//!
//! The caller picks the calling convention explicitly. Synchronous callbacks
//! return a `Result` and completion is signalled for them right after they
//! return. Deferred callbacks receive a [`Done`] and signal completion
//! themselves. Either way the transport only ever sees the deferred form.

use std::fmt;

use crate::chunk::{Chunk, Encoding};
use crate::error::StreamError;
use crate::transport::{Done, TransformStream, Transformer};

use super::Through;

/// Synchronous per-unit callback.
pub type SyncTransformFn = dyn FnMut(&Through, Chunk, Encoding) -> Result<(), StreamError>;

/// Per-unit callback that completes through its [`Done`] handle.
pub type DeferredTransformFn = dyn FnMut(&Through, Chunk, Encoding, Done);

/// Synchronous end-of-input callback.
pub type SyncFlushFn = dyn FnOnce(&Through) -> Result<(), StreamError>;

/// End-of-input callback that completes through its [`Done`] handle.
pub type DeferredFlushFn = dyn FnOnce(&Through, Done);

/// The per-unit callback of a [`Through`].
///
/// The first argument is the instance itself, so output is produced with
/// `this.push(..)`.
pub enum Transform {
    /// Completes when it returns. An `Err` fails the unit.
    Sync(Box<SyncTransformFn>),
    /// Completes when it calls its [`Done`].
    Deferred(Box<DeferredTransformFn>),
}

impl Transform {
    /// Wraps a synchronous callback.
    ///
    /// # Example
    ///
    /// ```
    /// use streamss_through::{through, Chunk, Transform};
    ///
    /// let upper = through(Transform::sync(|this, chunk, _enc| {
    ///     let text = chunk.to_text_lossy().unwrap_or_default();
    ///     this.push(text.to_uppercase());
    ///     Ok(())
    /// }));
    /// upper.write("abc");
    /// assert_eq!(upper.read(), Some(Chunk::from(&b"ABC"[..])));
    /// ```
    pub fn sync<F>(f: F) -> Self
    where
        F: FnMut(&Through, Chunk, Encoding) -> Result<(), StreamError> + 'static,
    {
        Transform::Sync(Box::new(f))
    }

    /// Wraps a callback that signals completion through [`Done`].
    ///
    /// The next unit is not processed until `done` is called.
    pub fn with_done<F>(f: F) -> Self
    where
        F: FnMut(&Through, Chunk, Encoding, Done) + 'static,
    {
        Transform::Deferred(Box::new(f))
    }

    /// Forwards every unit unchanged.
    pub fn passthrough() -> Self {
        Transform::sync(|this, chunk, _| {
            this.push(chunk);
            Ok(())
        })
    }

    /// Returns true for the synchronous convention.
    pub fn is_sync(&self) -> bool {
        matches!(self, Transform::Sync(_))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Sync(_) => f.write_str("Transform::Sync"),
            Transform::Deferred(_) => f.write_str("Transform::Deferred"),
        }
    }
}

/// The end-of-input callback of a [`Through`]. Runs at most once.
pub enum Flush {
    /// Completes when it returns. An `Err` fails the stream.
    Sync(Box<SyncFlushFn>),
    /// Completes when it calls its [`Done`].
    Deferred(Box<DeferredFlushFn>),
}

impl Flush {
    /// Wraps a synchronous flush callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: FnOnce(&Through) -> Result<(), StreamError> + 'static,
    {
        Flush::Sync(Box::new(f))
    }

    /// Wraps a flush callback that signals completion through [`Done`].
    pub fn with_done<F>(f: F) -> Self
    where
        F: FnOnce(&Through, Done) + 'static,
    {
        Flush::Deferred(Box::new(f))
    }

    /// Returns true for the synchronous convention.
    pub fn is_sync(&self) -> bool {
        matches!(self, Flush::Sync(_))
    }
}

impl fmt::Debug for Flush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flush::Sync(_) => f.write_str("Flush::Sync"),
            Flush::Deferred(_) => f.write_str("Flush::Deferred"),
        }
    }
}

/// Both callbacks, normalized to the transport's deferred convention.
pub(crate) struct Callbacks {
    transform: Transform,
    flush: Option<Flush>,
}

impl Callbacks {
    pub(crate) fn new(transform: Transform, flush: Option<Flush>) -> Self {
        Self { transform, flush }
    }
}

impl Transformer for Callbacks {
    fn transform(&mut self, stream: &TransformStream, chunk: Chunk, encoding: Encoding, done: Done) {
        let this = Through::from_stream(stream.clone());
        match &mut self.transform {
            Transform::Sync(f) => {
                let result = f(&this, chunk, encoding);
                done.call(result.err());
            }
            Transform::Deferred(f) => f(&this, chunk, encoding, done),
        }
    }

    fn flush(&mut self, stream: &TransformStream, done: Done) {
        let this = Through::from_stream(stream.clone());
        match self.flush.take() {
            None => done.ok(),
            Some(Flush::Sync(f)) => {
                let result = f(&this);
                done.call(result.err());
            }
            Some(Flush::Deferred(f)) => f(&this, done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_tags() {
        assert!(Transform::passthrough().is_sync());
        assert!(!Transform::with_done(|_, _, _, done| done.ok()).is_sync());
        assert!(Flush::sync(|_| Ok(())).is_sync());
        assert!(!Flush::with_done(|_, done| done.ok()).is_sync());
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Transform::passthrough()), "Transform::Sync");
        assert_eq!(
            format!("{:?}", Flush::with_done(|_, done| done.ok())),
            "Flush::Deferred"
        );
    }
}
