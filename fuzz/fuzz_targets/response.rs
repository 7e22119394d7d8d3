#![no_main]
use bsonwire::wire::OpResponseParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|buf: &[u8]| {
    let mut parser = OpResponseParser::new();
    for chunk in buf.chunks(7) {
        if parser.consume(chunk).is_err() || parser.done() {
            break;
        }
    }
    let _ = parser.into_result();
});
