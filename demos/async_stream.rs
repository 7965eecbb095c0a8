//! Async transform example.
//!
//! Feeds a `Through` from an async stream of units whose completions run
//! on a tokio `LocalSet`.
//!
//! Run with:
//!     cargo run --example async_stream

use std::time::Duration;

use futures_util::{StreamExt, stream};
use streamss_through::{Chunk, Flush, StreamError, Transform, through_async, through_obj};
use tokio::task::LocalSet;

#[tokio::main]
async fn main() -> Result<(), StreamError> {
    let local = LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), StreamError> {
    // Simulates a slow lookup per record
    let lookup = through_obj((
        Transform::with_done(|this, chunk, _, done| {
            let this = this.clone();
            tokio::task::spawn_local(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let id = chunk.downcast_ref::<u32>().copied().unwrap_or_default();
                this.push(Chunk::record(format!("user-{}", id)));
                done.ok();
            });
        }),
        Flush::sync(|this| {
            this.push(Chunk::record(String::from("lookup complete")));
            Ok(())
        }),
    ));

    let ids = stream::iter((1..=5u32).map(|id| Ok(Chunk::record(id))));
    let mut output = through_async(ids, lookup);

    while let Some(unit) = output.next().await {
        let unit = unit?;
        if let Some(name) = unit.downcast_ref::<String>() {
            println!("  {}", name);
        }
    }

    Ok(())
}
