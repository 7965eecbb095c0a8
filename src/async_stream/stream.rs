//! Async stream adapters for `Through`.
//!
//! - [`ThroughStream`] drives a [`Through`] from any `futures_core::Stream`
//!   of units and yields its output as a `Stream`.
//! - [`ReadStream`] turns a `futures_io::AsyncRead` into a `Stream` of byte
//!   units, ready to feed a [`ThroughStream`].
//!
//! Both are runtime-agnostic. A `Through` is single-threaded, so deferred
//! completions belong on a local executor (for tokio, a `LocalSet`).
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use streamss_through::{read_async, through, through_async, Transform};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead>(reader: R) -> Result<(), streamss_through::StreamError> {
//!     let counter = through(Transform::passthrough());
//!     let mut stream = through_async(read_async(reader, 64 * 1024), counter);
//!
//!     while let Some(chunk) = stream.next().await {
//!         let chunk = chunk?;
//!         println!("Chunk: {} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;
use tracing::debug;

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::through::Through;

/// Events collected from the `Through` between polls.
#[derive(Default)]
struct Inbox {
    items: RefCell<VecDeque<Result<Chunk, StreamError>>>,
    ended: Cell<bool>,
    awaiting_drain: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl Inbox {
    fn wake(&self) {
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }
}

pin_project! {
    /// A stream of the units a [`Through`] outputs while fed from `input`.
    ///
    /// Yields `Ok` units until the instance ends, or a single `Err` when an
    /// error is emitted on it. An `Err` from `input` is the upstream error:
    /// it is re-emitted on the instance when `pass_error` is on, and skipped
    /// otherwise.
    pub struct ThroughStream<S> {
        #[pin]
        input: S,
        through: Through,
        inbox: Rc<Inbox>,
        input_done: bool,
        finished: bool,
    }
}

impl<S> ThroughStream<S> {
    /// Creates the adapter and attaches it to `through`'s events.
    ///
    /// # Arguments
    ///
    /// * `input` - Stream of units to write into the instance
    /// * `through` - The instance doing the transformation
    pub fn new(input: S, through: Through) -> Self {
        let inbox = Rc::new(Inbox::default());

        let sink = inbox.clone();
        through.on_data(move |chunk| {
            sink.items.borrow_mut().push_back(Ok(chunk.clone()));
            sink.wake();
        });
        let sink = inbox.clone();
        through.on_error(move |err| {
            sink.items.borrow_mut().push_back(Err(err.clone()));
            sink.wake();
        });
        let sink = inbox.clone();
        through.on_end(move || {
            sink.ended.set(true);
            sink.wake();
        });
        let sink = inbox.clone();
        through.on_drain(move || {
            sink.awaiting_drain.set(false);
            sink.wake();
        });

        Self {
            input,
            through,
            inbox,
            input_done: false,
            finished: false,
        }
    }

    /// Returns the instance being driven.
    pub fn through(&self) -> &Through {
        &self.through
    }
}

impl<S> Stream for ThroughStream<S>
where
    S: Stream<Item = Result<Chunk, StreamError>>,
{
    type Item = Result<Chunk, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Output produced so far goes out first
            let next = this.inbox.items.borrow_mut().pop_front();
            if let Some(item) = next {
                if item.is_err() {
                    *this.finished = true;
                }
                return Poll::Ready(Some(item));
            }

            if *this.finished || this.inbox.ended.get() {
                *this.finished = true;
                return Poll::Ready(None);
            }

            *this.inbox.waker.borrow_mut() = Some(cx.waker().clone());

            if *this.input_done || this.inbox.awaiting_drain.get() {
                return Poll::Pending;
            }

            match this.input.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    if !this.through.write(chunk) && this.through.needs_drain() {
                        this.inbox.awaiting_drain.set(true);
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    if this.through.options().pass_error() {
                        this.through.emit_error(err);
                    } else {
                        debug!(error = %err, "upstream error not propagated");
                    }
                }
                Poll::Ready(None) => {
                    *this.input_done = true;
                    this.through.end();
                }
            }
        }
    }
}

/// Drives `through` from `input`, yielding its output.
///
/// # Example
///
/// ```ignore
/// use futures_util::{stream, StreamExt};
/// use streamss_through::{through, through_async, Chunk};
///
/// let input = stream::iter(vec![Ok(Chunk::from("a")), Ok(Chunk::from("b"))]);
/// let output: Vec<_> = through_async(input, through(())).collect().await;
/// assert_eq!(output.len(), 2);
/// ```
pub fn through_async<S>(input: S, through: Through) -> ThroughStream<S>
where
    S: Stream<Item = Result<Chunk, StreamError>>,
{
    ThroughStream::new(input, through)
}

pin_project! {
    /// A stream of byte units read from an async reader.
    pub struct ReadStream<R> {
        #[pin]
        reader: R,
        buffer: Vec<u8>,
        finished: bool,
    }
}

impl<R: AsyncRead> Stream for ReadStream<R> {
    type Item = Result<Chunk, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            match this.reader.as_mut().poll_read(cx, &mut this.buffer[..]) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Poll::Ready(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(StreamError::from(e))));
                }
                Poll::Ready(Ok(0)) => {
                    *this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Ok(n)) => {
                    let chunk = Chunk::Bytes(Bytes::copy_from_slice(&this.buffer[..n]));
                    return Poll::Ready(Some(Ok(chunk)));
                }
            }
        }
    }
}

/// Creates a stream of byte units of at most `chunk_size` bytes from an
/// async reader.
///
/// For tokio readers, convert with `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use streamss_through::read_async;
///
/// let file = tokio::fs::File::open("data.txt").await?;
/// let units = read_async(file.compat(), 16 * 1024);
/// ```
pub fn read_async<R: AsyncRead>(reader: R, chunk_size: usize) -> ReadStream<R> {
    ReadStream {
        reader,
        buffer: vec![0u8; chunk_size.max(1)],
        finished: false,
    }
}
