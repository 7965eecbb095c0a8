//! Data unit types.
//!
//! - [`Chunk`] - One unit flowing through a stream (bytes, text or record)
//! - [`Encoding`] - Encoding tag passed alongside each unit
//! - [`Decoder`] - Streaming byte-to-text decoder for the readable side

mod data;
mod encoding;

pub use data::Chunk;
pub use encoding::{Decoder, Encoding};
