//! Character encodings and the streaming byte-to-text decoder.

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

use crate::error::StreamError;
use crate::util::combine_bytes;

/// Encoding tag of a data unit, or of a stream's text output.
///
/// [`Encoding::Buffer`] marks raw bytes. The other variants name how text
/// maps to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Raw bytes, no character encoding.
    Buffer,
    /// UTF-8.
    #[default]
    Utf8,
    /// ISO-8859-1, one byte per char.
    Latin1,
    /// 7-bit ASCII. High bits are stripped when decoding.
    Ascii,
    /// Lowercase hexadecimal, two chars per byte.
    Hex,
}

impl Encoding {
    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Buffer => "buffer",
            Encoding::Utf8 => "utf8",
            Encoding::Latin1 => "latin1",
            Encoding::Ascii => "ascii",
            Encoding::Hex => "hex",
        }
    }

    /// Encodes text into bytes.
    ///
    /// Chars outside the target range are truncated for `Latin1`/`Ascii`.
    /// Hex input stops at the first invalid pair.
    pub fn encode(&self, text: &str) -> Bytes {
        match self {
            Encoding::Buffer | Encoding::Utf8 => Bytes::copy_from_slice(text.as_bytes()),
            Encoding::Latin1 | Encoding::Ascii => text.chars().map(|c| c as u32 as u8).collect(),
            Encoding::Hex => {
                let digits = text.as_bytes();
                let mut out = Vec::with_capacity(digits.len() / 2);
                for pair in digits.chunks_exact(2) {
                    match (hex_value(pair[0]), hex_value(pair[1])) {
                        (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                        _ => break,
                    }
                }
                Bytes::from(out)
            }
        }
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffer" => Ok(Encoding::Buffer),
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "ascii" => Ok(Encoding::Ascii),
            "hex" => Ok(Encoding::Hex),
            _ => Err(StreamError::InvalidConfig {
                message: "unknown encoding",
            }),
        }
    }
}

const REPLACEMENT: char = '\u{FFFD}';

/// Stateful decoder turning a sequence of byte chunks into text.
///
/// A UTF-8 sequence split across two chunks is held back until the rest
/// arrives. A partial sequence still pending at [`Decoder::end`] becomes
/// U+FFFD.
#[derive(Debug)]
pub struct Decoder {
    encoding: Encoding,
    pending: Bytes,
}

impl Decoder {
    /// Creates a decoder for `encoding`. `Buffer` decodes as UTF-8.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: Bytes::new(),
        }
    }

    /// Returns the encoding this decoder produces text for.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decodes the next chunk, returning the text that is complete so far.
    pub fn write(&mut self, data: &[u8]) -> String {
        match self.encoding {
            Encoding::Buffer | Encoding::Utf8 => self.write_utf8(data),
            Encoding::Latin1 => data.iter().map(|&b| b as char).collect(),
            Encoding::Ascii => data.iter().map(|&b| (b & 0x7f) as char).collect(),
            Encoding::Hex => {
                let mut out = String::with_capacity(data.len() * 2);
                for b in data {
                    out.push_str(&format!("{:02x}", b));
                }
                out
            }
        }
    }

    /// Flushes the decoder at end of input.
    pub fn end(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending = Bytes::new();
            REPLACEMENT.to_string()
        }
    }

    fn write_utf8(&mut self, data: &[u8]) -> String {
        let input = if self.pending.is_empty() {
            Bytes::copy_from_slice(data)
        } else {
            combine_bytes(&self.pending, data)
        };
        self.pending = Bytes::new();

        let mut out = String::with_capacity(input.len());
        let mut rest = &input[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    // `valid_up_to` is a checked prefix
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(REPLACEMENT);
                            rest = &tail[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more
                            self.pending = input.slice(input.len() - tail.len()..);
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}
