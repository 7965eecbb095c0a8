//! The `Through` instance and its constructors.

use std::fmt;
use std::io::Read;

use tracing::{debug, trace};

use crate::chunk::{Chunk, Encoding};
use crate::config::Options;
use crate::error::StreamError;
use crate::transport::{self, TransformStream};

use super::args::IntoArgs;
use super::callback::{Callbacks, Flush, Transform};

/// A transform stream built from plain closures.
///
/// `Through` embeds a [`TransformStream`] and delegates to it. Clones are
/// handles to the same stream.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use streamss_through::{through, Flush, Options, Encoding, Transform};
///
/// let out = Rc::new(RefCell::new(Vec::new()));
/// let sink = out.clone();
///
/// let bang = through((
///     Options::default().with_encoding(Encoding::Utf8),
///     Transform::sync(|this, chunk, _enc| {
///         let text = chunk.to_text_lossy().unwrap_or_default();
///         this.push(format!("{}!", text));
///         Ok(())
///     }),
///     Flush::sync(|this| {
///         this.push("done");
///         Ok(())
///     }),
/// ));
/// bang.on_data(move |chunk| sink.borrow_mut().push(chunk.as_text().unwrap().to_owned()));
///
/// for unit in ["a", "b", "c"] {
///     bang.write(unit);
/// }
/// bang.end();
///
/// assert_eq!(*out.borrow(), vec!["a!", "b!", "c!", "done"]);
/// ```
#[derive(Clone)]
pub struct Through {
    stream: TransformStream,
}

impl Through {
    /// Builds an instance from any supported argument shape.
    ///
    /// See [`IntoArgs`] for the shapes. Never fails: absent options use the
    /// defaults, an absent transform forwards units unchanged and an absent
    /// flush is skipped.
    pub fn new(args: impl IntoArgs) -> Self {
        let (options, transform, flush) = args.into_args().resolve();
        Self::build(options, transform, flush)
    }

    /// Like [`Through::new`], but always in object mode.
    ///
    /// Object mode is applied after the caller's options, so it wins over an
    /// explicit `with_object_mode(false)`.
    pub fn obj(args: impl IntoArgs) -> Self {
        let (options, transform, flush) = args.into_args().resolve();
        Self::build(options.with_object_mode(true), transform, flush)
    }

    fn build(options: Options, transform: Transform, flush: Option<Flush>) -> Self {
        trace!(
            object_mode = options.object_mode(),
            high_water_mark = options.high_water_mark(),
            sync_transform = transform.is_sync(),
            has_flush = flush.is_some(),
            "through constructed"
        );

        let stream = TransformStream::new(options, Callbacks::new(transform, flush));
        stream.on_pipe(forward_upstream_errors);
        Self { stream }
    }

    /// Wraps a stream handle handed to a callback.
    pub(crate) fn from_stream(stream: TransformStream) -> Self {
        Self { stream }
    }

    /// Returns the embedded transport stream.
    pub fn stream(&self) -> &TransformStream {
        &self.stream
    }

    /// Returns the options this instance was built with.
    pub fn options(&self) -> Options {
        self.stream.options()
    }

    /// Writes a unit. See [`TransformStream::write`].
    pub fn write(&self, chunk: impl Into<Chunk>) -> bool {
        self.stream.write(chunk)
    }

    /// Writes a unit whose text is in `encoding`.
    pub fn write_with_encoding(&self, chunk: impl Into<Chunk>, encoding: Encoding) -> bool {
        self.stream.write_with_encoding(chunk, encoding)
    }

    /// Signals end of input.
    pub fn end(&self) {
        self.stream.end()
    }

    /// Writes a final unit, then ends the input.
    pub fn end_with(&self, chunk: impl Into<Chunk>) {
        self.stream.end_with(chunk)
    }

    /// Emits an output unit. Callable any number of times per input unit.
    pub fn push(&self, chunk: impl Into<Chunk>) -> bool {
        self.stream.push(chunk)
    }

    /// Takes the next buffered output unit.
    pub fn read(&self) -> Option<Chunk> {
        self.stream.read()
    }

    /// Pipes output into `dest`, returning `dest` for chaining.
    ///
    /// With `pass_error` on (the default), `dest` re-emits errors of this
    /// instance.
    pub fn pipe(&self, dest: &Through) -> Through {
        self.stream.pipe(&dest.stream);
        dest.clone()
    }

    /// Feeds this instance from a blocking reader. See [`pump`](crate::pump).
    pub fn pump<R: Read>(&self, reader: R, chunk_size: usize) -> Result<u64, StreamError> {
        transport::pump(reader, &self.stream, chunk_size)
    }

    /// Emits an error on this instance.
    pub fn emit_error(&self, error: StreamError) {
        self.stream.emit_error(error)
    }

    /// Returns the first error emitted on this instance.
    pub fn error(&self) -> Option<StreamError> {
        self.stream.error()
    }

    /// Returns true while a writer should wait for `drain`.
    pub fn needs_drain(&self) -> bool {
        self.stream.needs_drain()
    }

    /// Returns true once flush completed.
    pub fn is_finished(&self) -> bool {
        self.stream.is_finished()
    }

    /// Returns true once the `end` event fired.
    pub fn is_ended(&self) -> bool {
        self.stream.is_ended()
    }

    /// Listens for output units.
    pub fn on_data(&self, listener: impl Fn(&Chunk) + 'static) {
        self.stream.on_data(listener)
    }

    /// Listens for the end of output.
    pub fn on_end(&self, listener: impl Fn() + 'static) {
        self.stream.on_end(listener)
    }

    /// Listens for flush completion.
    pub fn on_finish(&self, listener: impl Fn() + 'static) {
        self.stream.on_finish(listener)
    }

    /// Listens for the input buffer draining.
    pub fn on_drain(&self, listener: impl Fn() + 'static) {
        self.stream.on_drain(listener)
    }

    /// Listens for errors, including forwarded upstream errors.
    pub fn on_error(&self, listener: impl Fn(&StreamError) + 'static) {
        self.stream.on_error(listener)
    }

    /// Listens for upstream producers attaching.
    pub fn on_pipe(&self, listener: impl Fn(&TransformStream, &TransformStream) + 'static) {
        self.stream.on_pipe(listener)
    }
}

/// Pipe listener: re-emit `upstream`'s errors on `this`.
///
/// One error listener per attached upstream. The upstream keeps emitting its
/// own errors as before.
fn forward_upstream_errors(this: &TransformStream, upstream: &TransformStream) {
    if !this.options().pass_error() {
        return;
    }

    let downstream = this.downgrade();
    upstream.on_error(move |err| {
        if let Some(downstream) = downstream.upgrade() {
            debug!(error = %err, "forwarding upstream error");
            downstream.emit_error(err.clone());
        }
    });
}

impl fmt::Debug for Through {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Through").field(&self.stream).finish()
    }
}

impl Default for Through {
    fn default() -> Self {
        Self::new(())
    }
}

/// Factory form of [`Through::new`].
pub fn through(args: impl IntoArgs) -> Through {
    Through::new(args)
}

/// Factory form of [`Through::obj`].
pub fn through_obj(args: impl IntoArgs) -> Through {
    Through::obj(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_passthrough_default() {
        let stream = Through::default();
        stream.write("a");
        stream.write(&b"b"[..]);
        assert_eq!(stream.read(), Some(Chunk::from(&b"a"[..])));
        assert_eq!(stream.read(), Some(Chunk::from(&b"b"[..])));
    }

    #[test]
    fn test_obj_forces_object_mode() {
        let stream = Through::obj(Options::default().with_object_mode(false));
        assert!(stream.options().object_mode());

        let stream = through_obj(Transform::passthrough());
        assert!(stream.options().object_mode());
    }

    #[test]
    fn test_sync_error_fails_stream() {
        let stream = through(Transform::sync(|_, _, _| Err(StreamError::msg("nope"))));
        let seen = Rc::new(Cell::new(false));
        let flag = seen.clone();
        stream.on_error(move |err| flag.set(err.to_string() == "nope"));

        stream.write("x");
        assert!(seen.get());
        assert!(stream.error().is_some());
    }

    #[test]
    fn test_flush_error_fails_stream() {
        let stream = through((Transform::passthrough(), Flush::sync(|_| Err(StreamError::msg("late")))));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        stream.on_error(move |err| sink.borrow_mut().push(err.to_string()));
        stream.on_data(|_| {});

        stream.end();
        assert_eq!(*errors.borrow(), vec!["late".to_string()]);
        assert!(!stream.is_ended());
    }

    #[test]
    fn test_pipe_listener_respects_pass_error() {
        let upstream = through(());
        let downstream = through(Options::default().with_pass_error(false));
        upstream.pipe(&downstream);

        let forwarded = Rc::new(Cell::new(false));
        let flag = forwarded.clone();
        downstream.on_error(move |_| flag.set(true));
        upstream.on_error(|_| {});

        upstream.emit_error(StreamError::msg("bang"));
        assert!(!forwarded.get());
    }
}
