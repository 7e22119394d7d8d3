#![no_main]
use bsonwire::{NullSink, StreamParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|buf: &[u8]| {
    let mut parser = StreamParser::new();
    let _ = parser.consume(buf, &mut NullSink);

    // Same bytes, dribbled in, must never behave differently.
    let mut parser = StreamParser::new();
    for chunk in buf.chunks(3) {
        if parser.consume(chunk, &mut NullSink).is_err() {
            break;
        }
    }
});
