//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use bytes::Bytes;

/// Combines held-back bytes with the next chunk into one buffer.
///
/// The decoder uses this when a multi-byte sequence was split across
/// two chunks.
pub(crate) fn combine_bytes(a: &Bytes, b: &[u8]) -> Bytes {
    let mut combined = Vec::with_capacity(a.len() + b.len());
    combined.extend_from_slice(a);
    combined.extend_from_slice(b);
    Bytes::from(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_bytes() {
        let head = Bytes::from_static(&[0xe2, 0x82]);
        assert_eq!(&combine_bytes(&head, &[0xac])[..], "€".as_bytes());
        assert_eq!(&combine_bytes(&Bytes::new(), b"x")[..], b"x");
    }
}
