//! Async streaming support for `Through`.
//!
//! This module drives a [`Through`](crate::Through) from a
//! `futures_core::Stream` and reads units from a `futures_io::AsyncRead`,
//! making it runtime-agnostic and compatible with tokio, async-std, smol,
//! and other async runtimes.
//!
//! - [`through_async`] - Feeds an instance from a stream, yields its output
//! - [`read_async`] - Creates a stream of byte units from an async reader
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{ReadStream, ThroughStream, read_async, through_async};
