//! Configuration for stream behavior.
//!
//! This module provides the option set recognized when a stream is built:
//!
//! - [`Options`] - Mode flags, buffering threshold, encodings and error propagation

use crate::chunk::Encoding;

/// Default high water mark in byte mode (16 KiB).
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Default high water mark in object mode (16 units).
pub const DEFAULT_OBJECT_HIGH_WATER_MARK: usize = 16;

/// Options for a transform stream.
///
/// All fields have defaults, so `Options::default()` is a complete
/// configuration. Setters consume and return `self`.
///
/// # Example
///
/// ```
/// use streamss_through::{Encoding, Options};
///
/// let options = Options::default()
///     .with_high_water_mark(64)
///     .with_encoding(Encoding::Utf8)
///     .with_pass_error(false);
///
/// assert_eq!(options.high_water_mark(), 64);
/// assert!(!options.pass_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Options {
    object_mode: bool,
    high_water_mark: Option<usize>,
    encoding: Option<Encoding>,
    decode_strings: bool,
    default_encoding: Encoding,
    pass_error: bool,
}

impl Options {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for `Options::default().with_object_mode(true)`.
    pub fn objects() -> Self {
        Self::default().with_object_mode(true)
    }

    /// Carry opaque records instead of byte/text chunks.
    pub fn with_object_mode(mut self, object_mode: bool) -> Self {
        self.object_mode = object_mode;
        self
    }

    /// Sets the buffering threshold (bytes, or units in object mode).
    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = Some(high_water_mark);
        self
    }

    /// Decode output bytes to text with this encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// If `false`, written text stays text instead of being encoded to bytes.
    pub fn with_decode_strings(mut self, decode_strings: bool) -> Self {
        self.decode_strings = decode_strings;
        self
    }

    /// Sets the encoding assumed for text written without one.
    pub fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Enables re-emitting upstream errors on this stream.
    pub fn with_pass_error(mut self, pass_error: bool) -> Self {
        self.pass_error = pass_error;
        self
    }

    /// Returns whether object mode is on.
    pub fn object_mode(&self) -> bool {
        self.object_mode
    }

    /// Returns the effective high water mark.
    ///
    /// Falls back to [`DEFAULT_HIGH_WATER_MARK`] or
    /// [`DEFAULT_OBJECT_HIGH_WATER_MARK`] when unset.
    pub fn high_water_mark(&self) -> usize {
        match self.high_water_mark {
            Some(hwm) => hwm,
            None if self.object_mode => DEFAULT_OBJECT_HIGH_WATER_MARK,
            None => DEFAULT_HIGH_WATER_MARK,
        }
    }

    /// Returns the readable-side text encoding, if any.
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Returns whether written text is encoded to bytes.
    pub fn decode_strings(&self) -> bool {
        self.decode_strings
    }

    /// Returns the encoding assumed for written text.
    pub fn default_encoding(&self) -> Encoding {
        self.default_encoding
    }

    /// Returns whether upstream errors propagate to this stream.
    pub fn pass_error(&self) -> bool {
        self.pass_error
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            object_mode: false,
            high_water_mark: None,
            encoding: None,
            decode_strings: true,
            default_encoding: Encoding::Utf8,
            pass_error: true,
        }
    }
}
