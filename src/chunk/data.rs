//! The Chunk type - one unit of data flowing through a stream.

use bytes::Bytes;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::Encoding;

/// A data unit: a byte chunk, a text chunk, or an opaque record.
///
/// Records only travel through streams in object mode. Cloning a record
/// shares the same value.
///
/// # Example
///
/// ```
/// use streamss_through::Chunk;
///
/// let text = Chunk::from("hello");
/// assert_eq!(text.as_text(), Some("hello"));
///
/// let record = Chunk::record(42u32);
/// assert_eq!(record.downcast_ref::<u32>(), Some(&42));
/// ```
#[derive(Clone)]
pub enum Chunk {
    /// Raw bytes.
    Bytes(Bytes),

    /// Decoded text.
    Text(String),

    /// A structured record (object mode only).
    Record(Rc<dyn Any>),
}

impl Chunk {
    /// Wraps a value as a record.
    pub fn record<T: Any>(value: T) -> Self {
        Chunk::Record(Rc::new(value))
    }

    /// Returns the size this unit counts for in a byte-mode buffer.
    ///
    /// Text counts its UTF-8 length and a record counts as one.
    pub fn len(&self) -> usize {
        match self {
            Chunk::Bytes(b) => b.len(),
            Chunk::Text(s) => s.len(),
            Chunk::Record(_) => 1,
        }
    }

    /// Returns true if the unit carries no bytes or text.
    pub fn is_empty(&self) -> bool {
        match self {
            Chunk::Bytes(b) => b.is_empty(),
            Chunk::Text(s) => s.is_empty(),
            Chunk::Record(_) => false,
        }
    }

    /// Returns true for record units.
    pub fn is_record(&self) -> bool {
        matches!(self, Chunk::Record(_))
    }

    /// Returns the bytes, if this is a byte chunk.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Chunk::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the text, if this is a text chunk.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Chunk::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the record value if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Chunk::Record(r) => r.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Converts bytes or text into bytes, encoding text with `encoding`.
    ///
    /// Returns `None` for records.
    pub fn into_bytes(self, encoding: Encoding) -> Option<Bytes> {
        match self {
            Chunk::Bytes(b) => Some(b),
            Chunk::Text(s) => Some(encoding.encode(&s)),
            Chunk::Record(_) => None,
        }
    }

    /// Renders bytes or text as a string, replacing invalid UTF-8.
    ///
    /// Returns `None` for records.
    pub fn to_text_lossy(&self) -> Option<String> {
        match self {
            Chunk::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Chunk::Text(s) => Some(s.clone()),
            Chunk::Record(_) => None,
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Chunk::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Chunk::Record(_) => f.write_str("Record(..)"),
        }
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Chunk::Bytes(a), Chunk::Bytes(b)) => a == b,
            (Chunk::Text(a), Chunk::Text(b)) => a == b,
            (Chunk::Record(a), Chunk::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Bytes> for Chunk {
    fn from(b: Bytes) -> Self {
        Chunk::Bytes(b)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(v: Vec<u8>) -> Self {
        Chunk::Bytes(Bytes::from(v))
    }
}

impl From<&'static [u8]> for Chunk {
    fn from(s: &'static [u8]) -> Self {
        Chunk::Bytes(Bytes::from_static(s))
    }
}

impl From<String> for Chunk {
    fn from(s: String) -> Self {
        Chunk::Text(s)
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Chunk::Text(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_empty() {
        assert_eq!(Chunk::from("héllo").len(), 6);
        assert_eq!(Chunk::from(vec![1u8, 2, 3]).len(), 3);
        assert_eq!(Chunk::record("anything").len(), 1);

        assert!(Chunk::from("").is_empty());
        assert!(Chunk::Bytes(Bytes::new()).is_empty());
        assert!(!Chunk::record(()).is_empty());
    }

    #[test]
    fn test_record_identity() {
        let a = Chunk::record(vec![1, 2, 3]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Chunk::record(vec![1, 2, 3]));
        assert_eq!(a.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
        assert!(a.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_into_bytes() {
        let bytes = Chunk::from("abc").into_bytes(Encoding::Utf8).unwrap();
        assert_eq!(&bytes[..], b"abc");
        assert!(Chunk::record(1u8).into_bytes(Encoding::Utf8).is_none());
    }

    #[test]
    fn test_debug_hides_record() {
        assert_eq!(format!("{:?}", Chunk::record(7)), "Record(..)");
        assert_eq!(format!("{:?}", Chunk::from("x")), "Text(\"x\")");
    }
}
