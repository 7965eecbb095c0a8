//! Basic synchronous transform example.
//!
//! Run with:
//!     cargo run --example sync_basic

use std::cell::RefCell;
use std::rc::Rc;

use streamss_through::{Chunk, Flush, StreamError, Transform, through_obj};

fn main() -> Result<(), StreamError> {
    // Object mode keeps each written string as one unit
    let bang = through_obj((
        Transform::sync(|this, chunk, _enc| {
            let text = chunk.as_text().unwrap_or_default();
            this.push(format!("{}!", text));
            Ok(())
        }),
        Flush::sync(|this| {
            this.push("done");
            Ok(())
        }),
    ));

    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = out.clone();
    bang.on_data(move |chunk| {
        if let Some(text) = chunk.as_text() {
            sink.borrow_mut().push(text.to_owned());
        }
    });
    bang.on_end(|| println!("stream ended"));

    for unit in ["a", "b", "c"] {
        bang.write(Chunk::from(unit));
    }
    bang.end();

    if let Some(err) = bang.error() {
        return Err(err);
    }

    for (i, text) in out.borrow().iter().enumerate() {
        println!("Unit {}: {}", i + 1, text);
    }

    Ok(())
}
