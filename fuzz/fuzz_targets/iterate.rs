#![no_main]
use bsonwire::RawValue;
use libfuzzer_sys::fuzz_target;

fn walk(value: &RawValue<'_>, depth: u8) {
    if depth == 0 {
        return;
    }
    for (_, child) in value.iter() {
        let _ = child.as_i32();
        let _ = child.as_str();
        let _ = child.as_bindata();
        walk(&child, depth - 1);
    }
}

fuzz_target!(|buf: &[u8]| {
    if let Some(doc) = RawValue::document(buf) {
        walk(&doc, 8);
    }
});
