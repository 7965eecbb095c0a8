#![no_main]

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use libfuzzer_sys::fuzz_target;
use streamss_through::{Options, through};

fuzz_target!(|input: (u8, u16, Vec<u8>)| {
    let (read_size, high_water_mark, data) = input;

    let stream = through(Options::default().with_high_water_mark(high_water_mark as usize));
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = out.clone();
    stream.on_data(move |chunk| {
        sink.borrow_mut()
            .extend_from_slice(chunk.as_bytes().expect("byte mode emits bytes"))
    });

    let n = stream.pump(Cursor::new(&data), read_size as usize).unwrap();

    // Verify: every byte arrives once, in order
    assert_eq!(n, data.len() as u64);
    assert_eq!(*out.borrow(), data);

    // Verify: lifecycle completed
    assert!(stream.is_finished());
    assert!(stream.is_ended());
});
