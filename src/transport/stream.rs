//! Core transport engine - the duplex transform stream.
//!
//! [`TransformStream`] owns two queues. The writable queue holds units
//! waiting for the [`Transformer`]. The readable queue holds pushed output
//! waiting for a consumer. Units are dispatched strictly one at a time: the
//! next unit is handed out only after the previous one's [`Done`] was
//! called, and flush only after the last unit completed.
//!
//! # Example
//!
//! ```
//! use streamss_through::{Chunk, Done, Encoding, Options, TransformStream, Transformer};
//!
//! struct Upper;
//!
//! impl Transformer for Upper {
//!     fn transform(&mut self, stream: &TransformStream, chunk: Chunk, _: Encoding, done: Done) {
//!         let text = chunk.to_text_lossy().unwrap_or_default();
//!         stream.push(Chunk::from(text.to_uppercase()));
//!         done.ok();
//!     }
//! }
//!
//! let stream = TransformStream::new(Options::default().with_encoding(Encoding::Utf8), Upper);
//! stream.write("abc");
//! stream.end();
//! assert_eq!(stream.read(), Some(Chunk::from("ABC")));
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::chunk::{Chunk, Decoder, Encoding};
use crate::config::Options;
use crate::error::StreamError;

use super::done::Done;
use super::events::{Events, Signal};

/// The transformation stage plugged into a [`TransformStream`].
///
/// Both methods must eventually call `done` exactly once. The stream does
/// not dispatch anything else until they do.
pub trait Transformer {
    /// Processes one unit. Output goes through [`TransformStream::push`].
    fn transform(&mut self, stream: &TransformStream, chunk: Chunk, encoding: Encoding, done: Done);

    /// Runs once after the last unit completed. Defaults to no-op.
    fn flush(&mut self, _stream: &TransformStream, done: Done) {
        done.ok();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Unit { seq: u64, len: usize },
    Flush { seq: u64 },
}

impl InFlight {
    fn seq(&self) -> u64 {
        match self {
            InFlight::Unit { seq, .. } | InFlight::Flush { seq } => *seq,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushState {
    Idle,
    Running,
    Done,
}

enum Work {
    Unit {
        seq: u64,
        chunk: Chunk,
        encoding: Encoding,
    },
    Flush {
        seq: u64,
    },
}

struct State {
    options: Options,
    writable: VecDeque<(Chunk, Encoding)>,
    writable_len: usize,
    readable: VecDeque<Chunk>,
    readable_len: usize,
    decoder: Option<Decoder>,
    in_flight: Option<InFlight>,
    seq: u64,
    // Re-entrancy guards
    driving: bool,
    delivering: bool,
    flowing: bool,
    await_drain: usize,
    need_drain: bool,
    // `end()` was called
    ending: bool,
    flush: FlushState,
    // Readable side closed: no more pushes accepted
    eof: bool,
    ended: bool,
    error: Option<StreamError>,
    pipes: Vec<TransformStream>,
}

impl State {
    fn new(options: Options) -> Self {
        Self {
            options,
            writable: VecDeque::new(),
            writable_len: 0,
            readable: VecDeque::new(),
            readable_len: 0,
            decoder: options.encoding().map(Decoder::new),
            in_flight: None,
            seq: 0,
            driving: false,
            delivering: false,
            flowing: false,
            await_drain: 0,
            need_drain: false,
            ending: false,
            flush: FlushState::Idle,
            eof: false,
            ended: false,
            error: None,
            pipes: Vec::new(),
        }
    }

    fn unit_len(&self, chunk: &Chunk) -> usize {
        if self.options.object_mode() {
            1
        } else {
            chunk.len()
        }
    }

    /// Picks the next piece of work, if the stream may dispatch now.
    fn next_work(&mut self) -> Option<Work> {
        if self.error.is_some() || self.in_flight.is_some() {
            return None;
        }

        if !self.writable.is_empty() {
            // Readable-side backpressure: wait for the consumer
            if self.readable_len >= self.options.high_water_mark().max(1) {
                return None;
            }
            let (chunk, encoding) = self.writable.pop_front()?;
            self.seq += 1;
            self.in_flight = Some(InFlight::Unit {
                seq: self.seq,
                len: self.unit_len(&chunk),
            });
            return Some(Work::Unit {
                seq: self.seq,
                chunk,
                encoding,
            });
        }

        if self.ending && self.flush == FlushState::Idle {
            self.seq += 1;
            self.flush = FlushState::Running;
            self.in_flight = Some(InFlight::Flush { seq: self.seq });
            return Some(Work::Flush { seq: self.seq });
        }

        None
    }

    /// Writable-side normalization.
    fn normalize_written(
        &self,
        chunk: Chunk,
        encoding: Encoding,
    ) -> Result<(Chunk, Encoding), StreamError> {
        if self.options.object_mode() {
            return Ok(match chunk {
                Chunk::Bytes(_) => (chunk, Encoding::Buffer),
                other => (other, encoding),
            });
        }

        match chunk {
            Chunk::Record(_) => Err(StreamError::InvalidChunk {
                message: "records require object mode",
            }),
            Chunk::Text(text) if self.options.decode_strings() => {
                Ok((Chunk::Bytes(encoding.encode(&text)), Encoding::Buffer))
            }
            Chunk::Text(text) => Ok((Chunk::Text(text), encoding)),
            Chunk::Bytes(bytes) => Ok((Chunk::Bytes(bytes), Encoding::Buffer)),
        }
    }

    /// Readable-side normalization. `None` means nothing to enqueue.
    fn normalize_pushed(&mut self, chunk: Chunk) -> Result<Option<Chunk>, StreamError> {
        if self.options.object_mode() {
            return Ok(Some(chunk));
        }

        let bytes = match chunk {
            Chunk::Record(_) => {
                return Err(StreamError::InvalidChunk {
                    message: "records require object mode",
                });
            }
            Chunk::Text(text) => Encoding::Utf8.encode(&text),
            Chunk::Bytes(bytes) => bytes,
        };

        if bytes.is_empty() {
            return Ok(None);
        }

        match self.decoder.as_mut() {
            Some(decoder) => {
                let text = decoder.write(&bytes);
                Ok((!text.is_empty()).then_some(Chunk::Text(text)))
            }
            None => Ok(Some(Chunk::Bytes(bytes))),
        }
    }
}

pub(crate) struct Shared {
    state: RefCell<State>,
    events: RefCell<Events>,
    transformer: RefCell<Box<dyn Transformer>>,
}

/// A single-threaded duplex transform stream.
///
/// `TransformStream` is a handle: clones refer to the same stream.
#[derive(Clone)]
pub struct TransformStream {
    shared: Rc<Shared>,
}

/// A non-owning reference to a [`TransformStream`].
#[derive(Clone)]
pub struct WeakTransformStream {
    shared: Weak<Shared>,
}

impl WeakTransformStream {
    /// Returns the stream if it is still alive.
    pub fn upgrade(&self) -> Option<TransformStream> {
        self.shared.upgrade().map(TransformStream::from_shared)
    }
}

impl TransformStream {
    /// Creates a stream running `transformer` with `options`.
    pub fn new<T: Transformer + 'static>(options: Options, transformer: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State::new(options)),
                events: RefCell::new(Events::default()),
                transformer: RefCell::new(Box::new(transformer)),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<Shared>) -> Self {
        Self { shared }
    }

    /// Returns a weak handle that does not keep the stream alive.
    pub fn downgrade(&self) -> WeakTransformStream {
        WeakTransformStream {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Returns true if both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &TransformStream) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Returns the options the stream was built with.
    pub fn options(&self) -> Options {
        self.shared.state.borrow().options
    }

    //
    // Writable side
    //

    /// Writes a unit using the default encoding for text.
    ///
    /// Returns `false` once the buffered input reached the high water mark
    /// and is still waiting to drain. Wait for [`on_drain`](Self::on_drain)
    /// before writing more.
    pub fn write(&self, chunk: impl Into<Chunk>) -> bool {
        let encoding = self.options().default_encoding();
        self.write_with_encoding(chunk, encoding)
    }

    /// Writes a unit whose text is in `encoding`.
    pub fn write_with_encoding(&self, chunk: impl Into<Chunk>, encoding: Encoding) -> bool {
        let normalized = {
            let state = self.shared.state.borrow();
            if state.error.is_some() {
                return false;
            }
            if state.ending {
                None
            } else {
                Some(state.normalize_written(chunk.into(), encoding))
            }
        };

        let (chunk, encoding) = match normalized {
            None => {
                debug!("write after end");
                self.emit_error(StreamError::WriteAfterEnd);
                return false;
            }
            Some(Err(err)) => {
                self.emit_error(err);
                return false;
            }
            Some(Ok(unit)) => unit,
        };

        let below = {
            let mut state = self.shared.state.borrow_mut();
            state.writable_len += state.unit_len(&chunk);
            state.writable.push_back((chunk, encoding));
            let below = state.writable_len < state.options.high_water_mark();
            if !below {
                state.need_drain = true;
            }
            below
        };

        self.drive();
        // A sync transformer may have drained the buffer already
        below || !self.shared.state.borrow().need_drain
    }

    /// Signals end of input. Flush runs after the queued units complete.
    pub fn end(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.ending {
                return;
            }
            state.ending = true;
        }
        self.drive();
    }

    /// Writes a final unit, then ends the input.
    pub fn end_with(&self, chunk: impl Into<Chunk>) {
        self.write(chunk);
        self.end();
    }

    /// Returns true while a writer should wait for `drain`.
    pub fn needs_drain(&self) -> bool {
        self.shared.state.borrow().need_drain
    }

    /// Returns the buffered input size, including the unit in progress.
    pub fn writable_len(&self) -> usize {
        self.shared.state.borrow().writable_len
    }

    //
    // Readable side
    //

    /// Enqueues an output unit for consumers.
    ///
    /// Returns `false` once the unconsumed output reached the high water mark.
    pub fn push(&self, chunk: impl Into<Chunk>) -> bool {
        let normalized = {
            let mut state = self.shared.state.borrow_mut();
            if state.error.is_some() {
                return false;
            }
            if state.eof {
                None
            } else {
                Some(state.normalize_pushed(chunk.into()))
            }
        };

        match normalized {
            None => {
                self.emit_error(StreamError::PushAfterEof);
                return false;
            }
            Some(Err(err)) => {
                self.emit_error(err);
                return false;
            }
            Some(Ok(Some(chunk))) => {
                let mut state = self.shared.state.borrow_mut();
                state.readable_len += state.unit_len(&chunk);
                state.readable.push_back(chunk);
            }
            Some(Ok(None)) => {}
        }

        self.deliver();
        let state = self.shared.state.borrow();
        state.readable_len < state.options.high_water_mark()
    }

    /// Takes the next buffered output unit.
    ///
    /// Reading makes room for the transformer to continue when output
    /// backpressure paused it.
    pub fn read(&self) -> Option<Chunk> {
        let chunk = {
            let mut state = self.shared.state.borrow_mut();
            let chunk = state.readable.pop_front();
            if let Some(chunk) = &chunk {
                state.readable_len -= state.unit_len(chunk);
            }
            chunk
        };
        self.maybe_end();
        self.drive();
        chunk
    }

    /// Returns the unconsumed output size.
    pub fn readable_len(&self) -> usize {
        self.shared.state.borrow().readable_len
    }

    /// Forwards all output into `dest` and ends it when this stream ends.
    ///
    /// Pauses while `dest` reports backpressure. Fires `dest`'s pipe event.
    /// Errors are not forwarded here. Returns `dest` for chaining.
    pub fn pipe(&self, dest: &TransformStream) -> TransformStream {
        let already_ended = {
            let mut state = self.shared.state.borrow_mut();
            state.pipes.push(dest.clone());
            state.flowing = true;
            state.ended
        };

        let source = self.downgrade();
        dest.on_drain(move || {
            if let Some(source) = source.upgrade() {
                source.resume();
            }
        });
        dest.emit_pipe(self);

        if already_ended {
            dest.end();
        } else {
            self.deliver();
        }
        dest.clone()
    }

    /// Returns the first error emitted on this stream, if any.
    pub fn error(&self) -> Option<StreamError> {
        self.shared.state.borrow().error.clone()
    }

    /// Returns true once flush completed.
    pub fn is_finished(&self) -> bool {
        self.shared.state.borrow().flush == FlushState::Done
    }

    /// Returns true once the `end` event fired.
    pub fn is_ended(&self) -> bool {
        self.shared.state.borrow().ended
    }

    //
    // Events
    //

    /// Listens for output units. Switches the stream to flowing mode.
    pub fn on_data(&self, listener: impl Fn(&Chunk) + 'static) {
        self.shared.events.borrow_mut().data.push(Rc::new(listener));
        self.shared.state.borrow_mut().flowing = true;
        self.deliver();
    }

    /// Listens for the end of output.
    pub fn on_end(&self, listener: impl Fn() + 'static) {
        self.shared.events.borrow_mut().end.push(Rc::new(listener));
    }

    /// Listens for flush completion.
    pub fn on_finish(&self, listener: impl Fn() + 'static) {
        self.shared.events.borrow_mut().finish.push(Rc::new(listener));
    }

    /// Listens for the input buffer draining after backpressure.
    pub fn on_drain(&self, listener: impl Fn() + 'static) {
        self.shared.events.borrow_mut().drain.push(Rc::new(listener));
    }

    /// Listens for errors emitted on this stream.
    pub fn on_error(&self, listener: impl Fn(&StreamError) + 'static) {
        self.shared.events.borrow_mut().error.push(Rc::new(listener));
    }

    /// Listens for upstream producers attaching via [`pipe`](Self::pipe).
    ///
    /// The listener receives this stream and the upstream stream.
    pub fn on_pipe(&self, listener: impl Fn(&TransformStream, &TransformStream) + 'static) {
        self.shared.events.borrow_mut().pipe.push(Rc::new(listener));
    }

    /// Emits `error` on this stream and halts further processing.
    ///
    /// Every error listener sees every emitted error. Only the first is
    /// kept as [`error`](Self::error).
    pub fn emit_error(&self, error: StreamError) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.error.is_none() {
                state.error = Some(error.clone());
            }
        }

        let listeners = self.shared.events.borrow().error.clone();
        if listeners.is_empty() {
            warn!(error = %error, "stream error emitted with no listener");
        }
        for listener in listeners {
            listener(&error);
        }
    }

    fn emit_signal(&self, signal: Signal) {
        let listeners = self.shared.events.borrow().signal(signal);
        for listener in listeners {
            listener();
        }
    }

    fn emit_pipe(&self, source: &TransformStream) {
        let listeners = self.shared.events.borrow().pipe.clone();
        for listener in listeners {
            listener(self, source);
        }
    }

    //
    // Scheduling
    //

    /// Dispatches queued work until the stream has to wait.
    fn drive(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.driving {
                return;
            }
            state.driving = true;
        }

        loop {
            let work = self.shared.state.borrow_mut().next_work();
            let Some(work) = work else { break };

            let mut transformer = self.shared.transformer.borrow_mut();
            match work {
                Work::Unit {
                    seq,
                    chunk,
                    encoding,
                } => {
                    let done = Done::new(Rc::downgrade(&self.shared), seq);
                    transformer.transform(self, chunk, encoding, done);
                }
                Work::Flush { seq } => {
                    trace!("flush dispatched");
                    let done = Done::new(Rc::downgrade(&self.shared), seq);
                    transformer.flush(self, done);
                }
            }
        }

        self.shared.state.borrow_mut().driving = false;
    }

    /// Completion of the unit or flush tagged `seq`.
    pub(crate) fn complete(&self, seq: u64, error: Option<StreamError>) {
        let finished = {
            let mut state = self.shared.state.borrow_mut();
            let current = state.in_flight;
            let in_flight = match current {
                Some(in_flight) if in_flight.seq() == seq => in_flight,
                _ => {
                    drop(state);
                    warn!(seq, "stale completion signal ignored");
                    return;
                }
            };
            state.in_flight = None;
            match in_flight {
                InFlight::Unit { len, .. } => {
                    state.writable_len -= len;
                    false
                }
                InFlight::Flush { .. } => {
                    state.flush = FlushState::Done;
                    true
                }
            }
        };

        if let Some(error) = error {
            self.emit_error(error);
            return;
        }

        if finished {
            self.finish();
        } else {
            self.drive();
            self.maybe_drain();
        }
    }

    fn maybe_drain(&self) {
        let drain = {
            let mut state = self.shared.state.borrow_mut();
            if state.need_drain && state.writable_len == 0 && state.error.is_none() {
                state.need_drain = false;
                true
            } else {
                false
            }
        };
        if drain {
            self.emit_signal(Signal::Drain);
        }
    }

    /// Flush completed: close the readable side.
    fn finish(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.eof = true;
            let tail = state.decoder.as_mut().map(Decoder::end).unwrap_or_default();
            if !tail.is_empty() {
                state.readable_len += tail.len();
                state.readable.push_back(Chunk::Text(tail));
            }
        }
        self.emit_signal(Signal::Finish);
        self.deliver();
    }

    /// Hands buffered output to listeners and pipe destinations.
    fn deliver(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }

        loop {
            let next = {
                let mut state = self.shared.state.borrow_mut();
                if !state.flowing || state.await_drain > 0 || state.error.is_some() {
                    None
                } else {
                    let chunk = state.readable.pop_front();
                    if let Some(chunk) = &chunk {
                        state.readable_len -= state.unit_len(chunk);
                    }
                    chunk.map(|chunk| (chunk, state.pipes.clone()))
                }
            };
            let Some((chunk, pipes)) = next else { break };

            let listeners = self.shared.events.borrow().data.clone();
            for listener in listeners {
                listener(&chunk);
            }
            for dest in pipes {
                if !dest.write(chunk.clone()) && dest.needs_drain() {
                    self.shared.state.borrow_mut().await_drain += 1;
                }
            }
        }

        self.shared.state.borrow_mut().delivering = false;
        self.maybe_end();
        self.drive();
    }

    /// A pipe destination drained.
    fn resume(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.await_drain = state.await_drain.saturating_sub(1);
            if state.await_drain > 0 {
                return;
            }
        }
        self.deliver();
    }

    fn maybe_end(&self) {
        let pipes = {
            let mut state = self.shared.state.borrow_mut();
            if state.delivering
                || state.ended
                || !state.eof
                || !state.readable.is_empty()
                || state.error.is_some()
            {
                return;
            }
            state.ended = true;
            state.pipes.clone()
        };

        self.emit_signal(Signal::End);
        for dest in pipes {
            dest.end();
        }
    }
}

impl fmt::Debug for TransformStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("TransformStream")
            .field("options", &state.options)
            .field("writable_len", &state.writable_len)
            .field("readable_len", &state.readable_len)
            .field("ending", &state.ending)
            .field("ended", &state.ended)
            .field("error", &state.error)
            .finish()
    }
}
