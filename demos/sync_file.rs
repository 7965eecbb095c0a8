//! Reads a file through a two-stage pipeline.
//!
//! The first stage counts chunks and newlines, the second replaces
//! whitespace with dots.
//!
//! Run with:
//!     cargo run --example sync_file -- /path/to/file

use std::cell::Cell;
use std::env;
use std::fs::File;
use std::io::Write;
use std::rc::Rc;

use streamss_through::{Encoding, Flush, Options, Transform, through};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    println!("Reading file: {}\n", path);

    let file = File::open(&path)?;
    let metadata = file.metadata()?;
    println!("File size: {} bytes\n", metadata.len());

    let chunks = Rc::new(Cell::new(0usize));
    let lines = Rc::new(Cell::new(0usize));

    let (seen_chunks, seen_lines) = (chunks.clone(), lines.clone());
    let (total_chunks, total_lines) = (chunks.clone(), lines.clone());
    let counter = through((
        Options::default().with_encoding(Encoding::Utf8),
        Transform::sync(move |this, chunk, _| {
            seen_chunks.set(seen_chunks.get() + 1);
            if let Some(bytes) = chunk.as_bytes() {
                seen_lines.set(seen_lines.get() + bytes.iter().filter(|&&b| b == b'\n').count());
            }
            this.push(chunk);
            Ok(())
        }),
        Flush::sync(move |_| {
            eprintln!(
                "\n\nTotal: {} chunks, {} lines",
                total_chunks.get(),
                total_lines.get()
            );
            Ok(())
        }),
    ));

    // Text in, text out
    let dots = through((
        Options::default()
            .with_encoding(Encoding::Utf8)
            .with_decode_strings(false),
        Transform::sync(|this, chunk, _| {
            let text = chunk.to_text_lossy().unwrap_or_default();
            this.push(text.replace(char::is_whitespace, "."));
            Ok(())
        }),
    ));
    dots.on_data(|chunk| {
        if let Some(text) = chunk.as_text() {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
    });

    counter.pipe(&dots);
    counter.pump(file, 16 * 1024)?;

    if let Some(err) = dots.error() {
        return Err(err.into());
    }

    Ok(())
}
