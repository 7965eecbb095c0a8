// Async adapter tests: deferred completions on a local executor, stalls,
// tokio readers, upstream errors

#![cfg(feature = "async-io")]

use std::time::Duration;

use futures_util::{StreamExt, stream};
use streamss_through::{
    Chunk, Flush, Options, StreamError, Transform, read_async, through, through_async, through_obj,
};
use tokio::task::LocalSet;
use tokio_util::compat::TokioAsyncReadCompatExt;

fn lines() -> Vec<u8> {
    (1..=12)
        .map(|i| format!("line number {}\n", i))
        .collect::<String>()
        .into_bytes()
}

// ============================================================================
// Deferred completion
// ============================================================================

#[tokio::test]
async fn test_deferred_completion_on_local_set() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let delayed = through_obj(Transform::with_done(|this, chunk, _, done| {
                let this = this.clone();
                tokio::task::spawn_local(async move {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    this.push(chunk);
                    done.ok();
                });
            }));

            let input = stream::iter((0..5).map(|i| Ok(Chunk::record(i))));
            let output: Vec<_> = through_async(input, delayed).collect().await;
            let output = output.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

            let seen: Vec<i32> = output
                .iter()
                .map(|c| *c.downcast_ref::<i32>().unwrap())
                .collect();
            assert_eq!(seen, vec![0, 1, 2, 3, 4], "Order must survive deferral");
        })
        .await;
}

#[tokio::test]
async fn test_deferred_flush_on_local_set() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let summary = through((
                Transform::sync(|_, _, _| Ok(())),
                Flush::with_done(|this, done| {
                    let this = this.clone();
                    tokio::task::spawn_local(async move {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        this.push("summary");
                        done.ok();
                    });
                }),
            ));

            let input = stream::iter(vec![Ok(Chunk::from("a")), Ok(Chunk::from("b"))]);
            let output: Vec<_> = through_async(input, summary).collect().await;
            assert_eq!(output.len(), 1);
            assert_eq!(
                output[0].as_ref().unwrap(),
                &Chunk::from(&b"summary"[..])
            );
        })
        .await;
}

#[tokio::test]
async fn test_missing_completion_stalls() {
    let stuck = through(Transform::with_done(|_, _, _, done| drop(done)));
    let input = stream::iter(vec![Ok(Chunk::from("a")), Ok(Chunk::from("b"))]);
    let mut output = through_async(input, stuck);

    let next = tokio::time::timeout(Duration::from_millis(50), output.next()).await;
    assert!(next.is_err(), "Nothing may be produced without completion");
    assert!(!output.through().is_finished());
}

#[test]
fn test_parked_unit_keeps_stream_pending() {
    let parked = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let slot = parked.clone();
    let held = through(Transform::with_done(move |this, chunk, _, done| {
        this.push(chunk);
        slot.borrow_mut().push(done);
    }));
    let input = stream::iter(vec![Ok(Chunk::from("a")), Ok(Chunk::from("b"))]);
    let mut output = through_async(input, held);

    // First unit is output before its completion
    let mut next = tokio_test::task::spawn(output.next());
    assert!(matches!(tokio_test::assert_ready!(next.poll()), Some(Ok(_))));
    drop(next);

    let mut next = tokio_test::task::spawn(output.next());
    tokio_test::assert_pending!(next.poll());

    // Completing the parked unit releases the second one
    let done = parked.borrow_mut().remove(0);
    done.ok();
    assert!(next.is_woken());
    assert!(matches!(tokio_test::assert_ready!(next.poll()), Some(Ok(_))));
}

// ============================================================================
// Readers
// ============================================================================

#[tokio::test]
async fn test_tokio_reader_through_counter() {
    let data = lines();
    let reader = tokio::io::BufReader::new(&data[..]);

    let counter = {
        let count = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let seen = count.clone();
        through((
            Transform::sync(move |_, chunk, _| {
                let bytes = chunk.as_bytes().unwrap();
                seen.set(seen.get() + bytes.iter().filter(|&&b| b == b'\n').count());
                Ok(())
            }),
            Flush::sync(move |this| {
                this.push(count.get().to_string());
                Ok(())
            }),
        ))
    };

    let output: Vec<_> = through_async(read_async(reader.compat(), 9), counter)
        .collect()
        .await;
    let output = output.into_iter().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(output, vec![Chunk::from(&b"12"[..])]);
}

#[tokio::test]
async fn test_read_async_small_chunks() {
    let data = lines();
    let units: Vec<_> = read_async(&data[..], 4).collect().await;
    let units = units.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

    assert!(units.iter().all(|c| c.len() <= 4));
    let joined: Vec<u8> = units
        .iter()
        .flat_map(|c| c.as_bytes().unwrap().to_vec())
        .collect();
    assert_eq!(joined, data);
}

// ============================================================================
// Upstream errors
// ============================================================================

fn failing_input() -> impl futures_util::Stream<Item = Result<Chunk, StreamError>> {
    stream::iter(vec![
        Ok(Chunk::from("a")),
        Err(StreamError::msg("upstream")),
        Ok(Chunk::from("b")),
    ])
}

#[tokio::test]
async fn test_upstream_error_is_reemitted() {
    let output: Vec<_> = through_async(failing_input(), through(())).collect().await;

    assert_eq!(output.len(), 2);
    assert!(output[0].is_ok());
    assert_eq!(output[1].as_ref().unwrap_err().to_string(), "upstream");
}

#[tokio::test]
async fn test_upstream_error_skipped_without_pass_error() {
    let quiet = through(Options::default().with_pass_error(false));
    let output: Vec<_> = through_async(failing_input(), quiet).collect().await;
    let output = output.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

    assert_eq!(
        output,
        vec![Chunk::from(&b"a"[..]), Chunk::from(&b"b"[..])]
    );
}
