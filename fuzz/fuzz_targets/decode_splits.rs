#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use libfuzzer_sys::fuzz_target;
use streamss_through::{Decoder, Encoding, Options, through};

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let (data, cuts) = input;

    // Reference: decode in one piece
    let mut whole = Decoder::new(Encoding::Utf8);
    let mut expected = whole.write(&data);
    expected.push_str(&whole.end());

    // Split at arbitrary points, decoding through a stream
    let stream = through(Options::default().with_encoding(Encoding::Utf8));
    let out = Rc::new(RefCell::new(String::new()));
    let sink = out.clone();
    stream.on_data(move |chunk| sink.borrow_mut().push_str(chunk.as_text().expect("decoded text")));

    let mut rest = &data[..];
    for cut in cuts {
        if rest.is_empty() {
            break;
        }
        let at = (cut as usize % rest.len()) + 1;
        stream.write(rest[..at].to_vec());
        rest = &rest[at..];
    }
    if !rest.is_empty() {
        stream.write(rest.to_vec());
    }
    stream.end();

    // Verify: split points never change the decoded text
    assert_eq!(*out.borrow(), expected);
});
