//! Property tests: write programs are generated as value trees, serialized
//! with the writer, and checked against the parser and the view.

use std::collections::HashSet;

use bsonwire::{BinarySubtype, BsonWriter, Key, NullSink, RawValue, StreamParser};
use byteorder::{ByteOrder, LittleEndian};
use proptest::prelude::*;

use super::{Event, Recorder};

#[derive(Debug, Clone)]
enum Node {
    Int32(i32),
    Int64(i64),
    Double(f64),
    Bool(bool),
    Null,
    Str(String),
    Utc(i64),
    Ts(i64),
    Oid([u8; 12]),
    Bin(u8, Vec<u8>),
    Doc(Vec<(String, Node)>),
    Arr(Vec<Node>),
}

fn arbitrary_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        any::<i32>().prop_map(Node::Int32),
        any::<i64>().prop_map(Node::Int64),
        any::<f64>().prop_map(Node::Double),
        any::<bool>().prop_map(Node::Bool),
        Just(Node::Null),
        "[^\\x00]{0,12}".prop_map(Node::Str),
        any::<i64>().prop_map(Node::Utc),
        any::<i64>().prop_map(Node::Ts),
        any::<[u8; 12]>().prop_map(Node::Oid),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(subtype, bytes)| Node::Bin(subtype, bytes)),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(("[^\\x00]{0,8}", inner.clone()), 0..6).prop_map(Node::Doc),
            prop::collection::vec(inner, 0..6).prop_map(Node::Arr),
        ]
    })
}

fn arbitrary_fields() -> impl Strategy<Value = Vec<(String, Node)>> {
    prop::collection::vec(("[^\\x00]{0,8}", arbitrary_node()), 0..8)
}

fn write_node<K: Key>(w: &mut BsonWriter, key: K, node: &Node) {
    match node {
        Node::Int32(v) => w.element(key, *v),
        Node::Int64(v) => w.element(key, *v),
        Node::Double(v) => w.element(key, *v),
        Node::Bool(v) => w.element(key, *v),
        Node::Null => w.element_null(key),
        Node::Str(s) => w.element(key, s.as_str()),
        Node::Utc(v) => w.element_utc_datetime(key, *v),
        Node::Ts(v) => w.element_timestamp(key, *v),
        Node::Oid(bytes) => w.element_object_id(key, bytes),
        Node::Bin(subtype, bytes) => {
            w.element_bindata(key, BinarySubtype::from(*subtype), bytes)
        }
        Node::Doc(fields) => {
            w.push_document(key);
            for (name, child) in fields {
                write_node(w, name.as_str(), child);
            }
            w.pop();
        }
        Node::Arr(items) => {
            w.push_array(key);
            for (i, child) in items.iter().enumerate() {
                write_node(w, i as i32, child);
            }
            w.pop();
        }
    }
}

fn build(fields: &[(String, Node)]) -> Vec<u8> {
    let mut w = BsonWriter::new();
    w.document();
    for (name, child) in fields {
        write_node(&mut w, name.as_str(), child);
    }
    w.pop();
    w.to_vec()
}

fn node_events(out: &mut Vec<Event>, node: &Node) {
    match node {
        Node::Int32(v) => out.push(Event::Int32(*v)),
        Node::Int64(v) => out.push(Event::Int64(*v)),
        Node::Double(v) => out.push(Event::Double(v.to_bits())),
        Node::Bool(v) => out.push(Event::Bool(*v)),
        Node::Null => out.push(Event::Null),
        Node::Str(s) => out.push(Event::Utf8(s.as_bytes().to_vec())),
        Node::Utc(v) => out.push(Event::UtcDatetime(*v)),
        Node::Ts(v) => out.push(Event::Timestamp(*v)),
        Node::Oid(bytes) => out.push(Event::ObjectId(*bytes)),
        Node::Bin(subtype, bytes) => {
            out.push(Event::BindataSubtype(*subtype));
            out.push(Event::Bindata(bytes.clone()));
        }
        Node::Doc(fields) => {
            out.push(Event::OpenDoc);
            for (name, child) in fields {
                out.push(Event::FieldName(name.as_bytes().to_vec()));
                node_events(out, child);
            }
            out.push(Event::Close);
        }
        Node::Arr(items) => {
            out.push(Event::OpenArray);
            for (i, child) in items.iter().enumerate() {
                out.push(Event::FieldName(i.to_string().into_bytes()));
                node_events(out, child);
            }
            out.push(Event::Close);
        }
    }
}

fn expected(fields: &[(String, Node)]) -> Vec<Event> {
    let mut out = vec![Event::OpenDoc];
    for (name, child) in fields {
        out.push(Event::FieldName(name.as_bytes().to_vec()));
        node_events(&mut out, child);
    }
    out.push(Event::Close);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn written_bytes_stream_back_as_written(fields in arbitrary_fields()) {
        let bytes = build(&fields);

        // Length bookkeeping holds for every generated program.
        prop_assert_eq!(LittleEndian::read_i32(&bytes[0..4]) as usize, bytes.len());
        prop_assert_eq!(bytes[bytes.len() - 1], 0);

        let mut parser = StreamParser::new();
        let mut sink = Recorder::default();
        let used = parser.consume(&bytes, &mut sink).unwrap();
        prop_assert_eq!(used, bytes.len());
        prop_assert!(parser.done());
        prop_assert_eq!(sink.events, expected(&fields));
    }

    #[test]
    fn chunking_never_changes_the_event_stream(
        fields in arbitrary_fields(),
        chunk_size in 1usize..64,
    ) {
        let bytes = build(&fields);
        let mut whole_sink = Recorder::default();
        StreamParser::new().consume(&bytes, &mut whole_sink).unwrap();

        let mut parser = StreamParser::new();
        let mut sink = Recorder::default();
        for chunk in bytes.chunks(chunk_size) {
            let used = parser.consume(chunk, &mut sink).unwrap();
            prop_assert_eq!(used, chunk.len());
        }
        prop_assert!(parser.done());
        prop_assert_eq!(sink.events, whole_sink.events);
    }

    #[test]
    fn field_lookup_matches_first_iteration_hit(fields in arbitrary_fields()) {
        let bytes = build(&fields);
        let doc = RawValue::document(&bytes).unwrap();
        let mut seen = HashSet::new();
        for (key, value) in doc.iter() {
            if !seen.insert(key.to_vec()) {
                continue; // duplicate key: get_field reports the first hit
            }
            if let Ok(name) = std::str::from_utf8(key) {
                let found = doc.get_field(name).unwrap();
                prop_assert_eq!(found.tag(), value.tag());
                prop_assert_eq!(found.as_bytes(), value.as_bytes());
            }
        }
    }

    #[test]
    fn single_byte_mutation_never_panics(
        fields in arbitrary_fields(),
        position in any::<prop::sample::Index>(),
        byte in any::<u8>(),
    ) {
        let mut bytes = build(&fields);
        let position = position.index(bytes.len());
        bytes[position] = byte;

        // The parser must finish, latch an error, or suspend; anything but
        // an out-of-bounds read or panic.
        let mut parser = StreamParser::new();
        let _ = parser.consume(&bytes, &mut NullSink);

        // The view either refuses the buffer or iterates to a clean stop.
        if let Some(doc) = RawValue::document(&bytes) {
            for (_, value) in doc.iter() {
                let _ = value.as_i32();
                let _ = value.as_str();
                for (_, child) in value.iter() {
                    let _ = child.as_bytes();
                }
            }
        }
    }
}
