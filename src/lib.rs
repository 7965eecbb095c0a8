//! streamss-through
//!
//! Transform streams from plain closures.
//!
//! `streamss-through` builds a duplex transform stream out of a per-unit
//! transform closure and an optional end-of-input flush closure, without
//! defining a new type. It handles:
//!
//! - optional arguments (options, transform and flush may each be omitted)
//! - synchronous or deferred completion of each unit
//! - byte/text mode or object mode
//! - upstream error propagation across `pipe`
//!
//! The crate intentionally:
//! - does NOT spawn threads or tasks
//! - does NOT time out stalled callbacks
//! - does NOT retry failed units
//!
//! # Sync
//!
//! ```
//! use streamss_through::{through, Flush, Transform};
//!
//! let count = std::rc::Rc::new(std::cell::Cell::new(0));
//! let seen = count.clone();
//!
//! let counter = through((
//!     Transform::sync(move |this, chunk, _enc| {
//!         seen.set(seen.get() + 1);
//!         this.push(chunk);
//!         Ok(())
//!     }),
//!     Flush::sync(|_this| Ok(())),
//! ));
//!
//! counter.write("a");
//! counter.write("b");
//! counter.end();
//! assert_eq!(count.get(), 2);
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use streamss_through::{read_async, through, through_async};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead>(reader: R) -> Result<(), streamss_through::StreamError> {
//!     let mut stream = through_async(read_async(reader, 16 * 1024), through(()));
//!
//!     while let Some(chunk) = stream.next().await {
//!         let chunk = chunk?;
//!         println!("chunk {}", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod config;
mod error;
mod through;
mod transport;

mod util; // internal helpers

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use chunk::{Chunk, Decoder, Encoding};
pub use config::{DEFAULT_HIGH_WATER_MARK, DEFAULT_OBJECT_HIGH_WATER_MARK, Options};
pub use error::StreamError;
pub use through::{
    Args, DeferredFlushFn, DeferredTransformFn, Flush, IntoArgs, SyncFlushFn, SyncTransformFn,
    Through, Transform, through, through_obj,
};
pub use transport::{Done, TransformStream, Transformer, WeakTransformStream, pump};

#[cfg(feature = "async-io")]
pub use async_stream::{ReadStream, ThroughStream, read_async, through_async};
