//! The duplex transform stream that [`Through`](crate::Through) is built on.
//!
//! - [`TransformStream`] - Queueing, ordering, backpressure, events and `pipe`
//! - [`Transformer`] - The transformation stage plugged into a stream
//! - [`Done`] - Completion handle for one unit or for the flush
//! - [`pump`] - Blocking source reading from a [`std::io::Read`]
//!
//! Streams are single-threaded (`Rc` inside). All scheduling is cooperative:
//! work runs inside `write`, `end`, `read` and completion calls.

mod done;
mod events;
mod source;
mod stream;

pub use done::Done;
pub use source::pump;
pub use stream::{TransformStream, Transformer, WeakTransformStream};
