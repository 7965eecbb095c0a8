//! Transform streams from plain closures.
//!
//! - [`Through`] - The instance: a transform stream running user callbacks
//! - [`Transform`] / [`Flush`] - Callbacks in sync or deferred convention
//! - [`IntoArgs`] - The accepted constructor argument shapes
//! - [`through`] / [`through_obj`] - Factory functions
//!
//! Upstream error propagation is wired on every instance: when a stream is
//! piped into an instance with `pass_error` on, errors of that upstream are
//! re-emitted on the instance as the same value.

mod args;
mod callback;
mod instance;

pub use args::{Args, IntoArgs};
pub use callback::{
    DeferredFlushFn, DeferredTransformFn, Flush, SyncFlushFn, SyncTransformFn, Transform,
};
pub use instance::{Through, through, through_obj};
