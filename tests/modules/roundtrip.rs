use bsonwire::{
    extjson::{self, JsonDumper},
    BinarySubtype, BsonWriter, RawValue, StreamParser,
};
use pretty_assertions::assert_eq;

use super::{Event, Recorder};

fn deep_sample() -> Vec<u8> {
    let mut w = BsonWriter::new();
    w.document();
    w.element("title", "a reasonably involved document");
    w.element("count", 42i32);
    w.element("big", 1i64 << 40);
    w.element("ratio", 0.625f64);
    w.element("yes", true);
    w.element_null("none");
    w.element_utc_datetime("at", 1_445_453_400);
    w.element_timestamp("ts", (7i64 << 32) | 3);
    w.element_object_id("id", b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c");
    w.element_bindata("blob", BinarySubtype::UserDefined(0x80), &[0, 1, 2, 254, 255]);
    w.push_array("items");
    w.element(0, "first");
    w.element(1, 2i32);
    w.push_document(2);
    w.element("nested", false);
    w.push_array("deeper");
    w.element(0, 0.5f64);
    w.pop();
    w.pop();
    w.pop();
    w.pop();
    w.to_vec()
}

fn expected_events() -> Vec<Event> {
    use Event::*;
    vec![
        OpenDoc,
        FieldName(b"title".to_vec()),
        Utf8(b"a reasonably involved document".to_vec()),
        FieldName(b"count".to_vec()),
        Int32(42),
        FieldName(b"big".to_vec()),
        Int64(1i64 << 40),
        FieldName(b"ratio".to_vec()),
        Double(0.625f64.to_bits()),
        FieldName(b"yes".to_vec()),
        Bool(true),
        FieldName(b"none".to_vec()),
        Null,
        FieldName(b"at".to_vec()),
        UtcDatetime(1_445_453_400),
        FieldName(b"ts".to_vec()),
        Timestamp((7i64 << 32) | 3),
        FieldName(b"id".to_vec()),
        ObjectId(*b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c"),
        FieldName(b"blob".to_vec()),
        BindataSubtype(0x80),
        Bindata(vec![0, 1, 2, 254, 255]),
        FieldName(b"items".to_vec()),
        OpenArray,
        FieldName(b"0".to_vec()),
        Utf8(b"first".to_vec()),
        FieldName(b"1".to_vec()),
        Int32(2),
        FieldName(b"2".to_vec()),
        OpenDoc,
        FieldName(b"nested".to_vec()),
        Bool(false),
        FieldName(b"deeper".to_vec()),
        OpenArray,
        FieldName(b"0".to_vec()),
        Double(0.5f64.to_bits()),
        Close,
        Close,
        Close,
        Close,
    ]
}

#[test]
fn writer_output_streams_back_as_written() {
    let bytes = deep_sample();
    let mut parser = StreamParser::new();
    let mut sink = Recorder::default();
    let used = parser.consume(&bytes, &mut sink).unwrap();
    assert_eq!(used, bytes.len());
    assert!(parser.done());
    assert_eq!(sink.events, expected_events());
}

#[test]
fn every_chunking_yields_the_same_events() {
    let bytes = deep_sample();
    let whole = {
        let mut parser = StreamParser::new();
        let mut sink = Recorder::default();
        parser.consume(&bytes, &mut sink).unwrap();
        sink.events
    };

    for chunk_size in 1..=bytes.len() {
        let mut parser = StreamParser::new();
        let mut sink = Recorder::default();
        for chunk in bytes.chunks(chunk_size) {
            let used = parser.consume(chunk, &mut sink).unwrap();
            assert_eq!(used, chunk.len());
        }
        assert!(parser.done(), "chunk size {chunk_size}");
        assert_eq!(sink.events, whole, "chunk size {chunk_size}");
    }
}

#[test]
fn stream_and_view_render_the_same_json() {
    let bytes = deep_sample();

    let mut streamed = JsonDumper::new();
    StreamParser::new().consume(&bytes, &mut streamed).unwrap();

    let mut walked = JsonDumper::new();
    let doc = RawValue::document(&bytes).unwrap();
    assert!(extjson::print_value(&doc, &mut walked));

    assert_eq!(streamed.as_str(), walked.as_str());
}

#[test]
fn every_key_is_findable() {
    let bytes = deep_sample();
    let doc = RawValue::document(&bytes).unwrap();
    let mut seen = 0;
    for (key, value) in doc.iter() {
        let name = std::str::from_utf8(key).unwrap();
        let found = doc.get_field(name).unwrap();
        assert_eq!(found.tag(), value.tag());
        assert_eq!(found.as_bytes(), value.as_bytes());
        seen += 1;
    }
    assert_eq!(seen, 11);
    assert!(doc.get_field("absent").is_none());
}

#[test]
fn nested_traversal_reaches_leaves() {
    let bytes = deep_sample();
    let doc = RawValue::document(&bytes).unwrap();

    let outer = doc
        .get_field("items")
        .and_then(|items| items.iter().nth(2).map(|(_, v)| v))
        .unwrap();
    let deeper = outer.get_field("deeper").unwrap();
    assert_eq!(
        deeper.iter().next().unwrap().1.as_f64(),
        Some(0.5),
    );
}
