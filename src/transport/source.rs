//! Blocking source feeding a stream from a [`std::io::Read`].

use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::chunk::Chunk;
use crate::error::StreamError;

use super::TransformStream;

/// Reads `reader` to the end in chunks of at most `chunk_size` bytes,
/// writes each chunk into `dest`, then ends `dest`.
///
/// The reader acts as `dest`'s upstream producer: an I/O error is returned
/// and, when `dest` has `pass_error` on, also emitted on `dest`. Stops early
/// with `dest`'s own error if `dest` fails.
///
/// Returns the number of bytes read.
///
/// Writes do not wait for `drain`; `dest` buffers whatever its transformer
/// has not processed yet.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use streamss_through::{pump, through};
///
/// let stream = through(());
/// let n = pump(Cursor::new(b"hello world".to_vec()), stream.stream(), 4)?;
/// assert_eq!(n, 11);
/// # Ok::<(), streamss_through::StreamError>(())
/// ```
pub fn pump<R: Read>(
    mut reader: R,
    dest: &TransformStream,
    chunk_size: usize,
) -> Result<u64, StreamError> {
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                let err = StreamError::from(e);
                if dest.options().pass_error() {
                    dest.emit_error(err.clone());
                }
                return Err(err);
            }
        };

        total += n as u64;
        dest.write(Chunk::Bytes(Bytes::copy_from_slice(&buffer[..n])));
        if let Some(err) = dest.error() {
            return Err(err);
        }
    }

    dest.end();
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::transport::{Done, Transformer};
    use crate::chunk::Encoding;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    struct Sizes(Rc<RefCell<Vec<usize>>>);

    impl Transformer for Sizes {
        fn transform(&mut self, _: &TransformStream, chunk: Chunk, _: Encoding, done: Done) {
            self.0.borrow_mut().push(chunk.len());
            done.ok();
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_pump_chunk_sizes() {
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let stream = TransformStream::new(Options::default(), Sizes(sizes.clone()));

        let n = pump(Cursor::new(vec![7u8; 10]), &stream, 4).unwrap();
        assert_eq!(n, 10);
        assert_eq!(*sizes.borrow(), vec![4, 4, 2]);
        assert!(stream.is_finished());
    }

    #[test]
    fn test_pump_error_reaches_stream() {
        let stream = TransformStream::new(Options::default(), Sizes(Rc::default()));
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        stream.on_error(move |err| *sink.borrow_mut() = Some(err.clone()));

        let err = pump(Failing, &stream, 4).unwrap_err();
        let seen = seen.borrow().clone().unwrap();
        assert!(err.same_as(&seen));
    }

    #[test]
    fn test_pump_error_kept_local_without_pass_error() {
        let stream = TransformStream::new(
            Options::default().with_pass_error(false),
            Sizes(Rc::default()),
        );
        assert!(pump(Failing, &stream, 4).is_err());
        assert!(stream.error().is_none());
    }
}
