//! Async file transform example with tokio.
//!
//! Reads a file with tokio, counts its lines and prints a summary from the
//! flush callback.
//!
//! Run with:
//!     cargo run --example async_tokio -- /path/to/file

use std::cell::Cell;
use std::env;
use std::rc::Rc;

use futures_util::StreamExt;
use streamss_through::{Flush, Transform, read_async, through, through_async};
use tokio_util::compat::TokioAsyncReadCompatExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let file = tokio::fs::File::open(&path).await?;
    println!("Counting lines in {}...\n", path);

    let lines = Rc::new(Cell::new(0usize));
    let seen = lines.clone();
    let counter = through((
        Transform::sync(move |_, chunk, _| {
            if let Some(bytes) = chunk.as_bytes() {
                seen.set(seen.get() + bytes.iter().filter(|&&b| b == b'\n').count());
            }
            Ok(())
        }),
        Flush::sync(move |this| {
            this.push(format!("{} lines", lines.get()));
            Ok(())
        }),
    ));

    let mut output = through_async(read_async(file.compat(), 16 * 1024), counter);
    while let Some(unit) = output.next().await {
        let unit = unit?;
        if let Some(text) = unit.to_text_lossy() {
            println!("{}", text);
        }
    }

    Ok(())
}
