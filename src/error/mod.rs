//! Error types for streamss-through.

use std::fmt;
use std::sync::Arc;

/// Errors surfaced through a stream's error signal.
///
/// Cloning is cheap. A clone of a [`StreamError::Callback`] shares the same
/// underlying error value, which is what [`StreamError::same_as`] checks.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// A transform or flush callback reported a failure.
    Callback(Arc<dyn std::error::Error + Send + Sync>),

    /// An I/O error occurred while reading from a source.
    Io(Arc<std::io::Error>),

    /// A unit was written after `end` was called.
    WriteAfterEnd,

    /// A unit was pushed after the readable side was closed.
    PushAfterEof,

    /// The unit does not fit the stream's mode.
    InvalidChunk {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

/// Plain message error used by [`StreamError::msg`].
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

impl StreamError {
    /// Wraps any error as a callback failure.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StreamError::Callback(Arc::new(err))
    }

    /// Creates a callback failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        StreamError::Callback(Arc::new(Message(message.into())))
    }

    /// Returns `true` if both values denote the same error.
    ///
    /// Shared variants compare by identity, the rest by kind.
    pub fn same_as(&self, other: &StreamError) -> bool {
        match (self, other) {
            (StreamError::Callback(a), StreamError::Callback(b)) => Arc::ptr_eq(a, b),
            (StreamError::Io(a), StreamError::Io(b)) => Arc::ptr_eq(a, b),
            (StreamError::WriteAfterEnd, StreamError::WriteAfterEnd) => true,
            (StreamError::PushAfterEof, StreamError::PushAfterEof) => true,
            (StreamError::InvalidChunk { message: a }, StreamError::InvalidChunk { message: b }) => {
                a == b
            }
            (StreamError::InvalidConfig { message: a }, StreamError::InvalidConfig { message: b }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Callback(e) => write!(f, "{}", e),
            StreamError::Io(e) => write!(f, "io error: {}", e),
            StreamError::WriteAfterEnd => f.write_str("write after end"),
            StreamError::PushAfterEof => f.write_str("push after end of stream"),
            StreamError::InvalidChunk { message } => write!(f, "invalid chunk: {}", message),
            StreamError::InvalidConfig { message } => write!(f, "invalid config: {}", message),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Callback(e) => Some(e.as_ref()),
            StreamError::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        StreamError::Io(Arc::new(e))
    }
}
