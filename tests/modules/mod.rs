mod props;
mod roundtrip;

use bsonwire::{spec::OBJECT_ID_LEN, BinarySubtype, EventSink};

/// Records every parse event in a comparable, owned form. String-like
/// chunks are coalesced on the fly so recordings are chunk-size
/// independent; the zero-length terminator call closes the pending value.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    OpenDoc,
    OpenArray,
    Close,
    FieldName(Vec<u8>),
    Int32(i32),
    Int64(i64),
    /// Bit pattern, so NaNs compare by representation.
    Double(u64),
    Bool(bool),
    Null,
    Utf8(Vec<u8>),
    Js(Vec<u8>),
    BindataSubtype(u8),
    Bindata(Vec<u8>),
    UtcDatetime(i64),
    Timestamp(i64),
    ObjectId([u8; OBJECT_ID_LEN]),
}

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    name: Option<Vec<u8>>,
    string: Option<Vec<u8>>,
}

impl Recorder {
    fn push_chunk(slot: &mut Option<Vec<u8>>, chunk: &[u8]) -> Option<Vec<u8>> {
        if slot.is_none() {
            *slot = Some(Vec::new());
        }
        if chunk.is_empty() {
            slot.take()
        } else {
            if let Some(acc) = slot.as_mut() {
                acc.extend_from_slice(chunk);
            }
            None
        }
    }
}

impl EventSink for Recorder {
    fn open_doc(&mut self) {
        self.events.push(Event::OpenDoc);
    }
    fn open_array(&mut self) {
        self.events.push(Event::OpenArray);
    }
    fn close(&mut self) {
        self.events.push(Event::Close);
    }
    fn field_name(&mut self, chunk: &[u8]) {
        if let Some(name) = Self::push_chunk(&mut self.name, chunk) {
            self.events.push(Event::FieldName(name));
        }
    }
    fn int32(&mut self, v: i32) {
        self.events.push(Event::Int32(v));
    }
    fn int64(&mut self, v: i64) {
        self.events.push(Event::Int64(v));
    }
    fn double(&mut self, v: f64) {
        self.events.push(Event::Double(v.to_bits()));
    }
    fn boolean(&mut self, v: bool) {
        self.events.push(Event::Bool(v));
    }
    fn null(&mut self) {
        self.events.push(Event::Null);
    }
    fn utf8(&mut self, chunk: &[u8]) {
        if let Some(s) = Self::push_chunk(&mut self.string, chunk) {
            self.events.push(Event::Utf8(s));
        }
    }
    fn js(&mut self, chunk: &[u8]) {
        if let Some(s) = Self::push_chunk(&mut self.string, chunk) {
            self.events.push(Event::Js(s));
        }
    }
    fn bindata_subtype(&mut self, subtype: BinarySubtype) {
        self.events.push(Event::BindataSubtype(subtype.into()));
    }
    fn bindata(&mut self, chunk: &[u8]) {
        if let Some(s) = Self::push_chunk(&mut self.string, chunk) {
            self.events.push(Event::Bindata(s));
        }
    }
    fn utc_datetime(&mut self, v: i64) {
        self.events.push(Event::UtcDatetime(v));
    }
    fn timestamp(&mut self, v: i64) {
        self.events.push(Event::Timestamp(v));
    }
    fn object_id(&mut self, bytes: &[u8; OBJECT_ID_LEN]) {
        self.events.push(Event::ObjectId(*bytes));
    }
}
