//! A reentrant, resumable streaming parser for BSON documents.
//!
//! [`StreamParser`] consumes byte chunks of any size and emits semantic
//! events through an [`EventSink`]. Its state between calls is a dozen bytes
//! of scratch plus a few counters; it never buffers payloads and never holds
//! a reference into the input across calls, so it can sit directly behind
//! any I/O loop. String-like values (field names, utf8, js, bindata) are
//! delivered in whatever chunks the input arrives in, terminated by one call
//! with an empty slice.

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    error::{Error, Result},
    spec::{BinarySubtype, ElementType, OBJECT_ID_LEN},
};

/// Receiver for parse events.
///
/// Every method has an empty default body; a sink implements only what it
/// cares about. Parsers are generic over the sink, so dispatch is static.
///
/// Chunked methods ([`field_name`](EventSink::field_name),
/// [`utf8`](EventSink::utf8), [`js`](EventSink::js),
/// [`bindata`](EventSink::bindata)) may be called several times per value
/// and are always called one final time with an empty slice.
pub trait EventSink {
    fn open_doc(&mut self) {}

    fn open_array(&mut self) {}

    fn close(&mut self) {}

    fn field_name(&mut self, _chunk: &[u8]) {}

    fn int32(&mut self, _value: i32) {}

    fn int64(&mut self, _value: i64) {}

    fn double(&mut self, _value: f64) {}

    fn boolean(&mut self, _value: bool) {}

    fn null(&mut self) {}

    fn utf8(&mut self, _chunk: &[u8]) {}

    fn js(&mut self, _chunk: &[u8]) {}

    fn bindata_subtype(&mut self, _subtype: BinarySubtype) {}

    fn bindata(&mut self, _chunk: &[u8]) {}

    fn utc_datetime(&mut self, _value: i64) {}

    fn timestamp(&mut self, _value: i64) {}

    fn object_id(&mut self, _bytes: &[u8; OBJECT_ID_LEN]) {}
}

/// A sink that ignores everything. Useful for skipping documents.
pub struct NullSink;

impl EventSink for NullSink {}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    FieldType,
    FieldName,
    ReadInt32,
    ReadInt64,
    ReadDouble,
    ReadBool,
    ReadString,
    ReadStringTerm,
    ReadBinSubtype,
    ReadObjectId,
    Done,
    Error,
}

// Scratch must hold the widest fixed-size value (an object id).
const SCRATCH_LEN: usize = OBJECT_ID_LEN;

/// The streaming document parser.
///
/// ```
/// use bsonwire::{BsonWriter, EventSink, StreamParser};
///
/// struct Count(usize);
/// impl EventSink for Count {
///     fn int32(&mut self, _v: i32) {
///         self.0 += 1;
///     }
/// }
///
/// let mut w = BsonWriter::new();
/// w.document();
/// w.element("a", 1i32);
/// w.pop();
///
/// let mut parser = StreamParser::new();
/// let mut sink = Count(0);
/// let used = parser.consume(w.data(), &mut sink).unwrap();
/// assert_eq!(used, w.len());
/// assert!(parser.done());
/// assert_eq!(sink.0, 1);
/// ```
pub struct StreamParser {
    state: State,
    tag: ElementType,
    depth: i8,
    // Bytes of the current fixed-width value already in scratch, or bytes of
    // the current string-like value still expected.
    partial: i32,
    bytes_seen: i64,
    scratch: [u8; SCRATCH_LEN],
}

impl StreamParser {
    pub fn new() -> StreamParser {
        StreamParser {
            state: State::ReadInt32,
            tag: ElementType::Document,
            depth: 0,
            partial: 0,
            bytes_seen: 0,
            scratch: [0; SCRATCH_LEN],
        }
    }

    /// Resets the parser so it can read another document.
    pub fn clear(&mut self) {
        // Parsing starts by consuming the outer length prefix with the
        // pending tag preset to Document.
        self.state = State::ReadInt32;
        self.tag = ElementType::Document;
        self.depth = 0;
        self.partial = 0;
        self.bytes_seen = 0;
    }

    /// Whether parsing has terminated, successfully or not.
    pub fn done(&self) -> bool {
        self.state == State::Done || self.state == State::Error
    }

    /// Total bytes accepted across all `consume` calls.
    pub fn bytes_seen(&self) -> i64 {
        self.bytes_seen
    }

    /// Feeds a chunk, returning how many of its bytes were consumed.
    ///
    /// Fewer bytes than `input.len()` are consumed only when the document
    /// completed mid-chunk; the caller owns whatever follows. An `Err`
    /// latches the parser permanently; a latched parser consumes nothing.
    pub fn consume<S: EventSink>(&mut self, input: &[u8], sink: &mut S) -> Result<usize> {
        let mut pos = 0usize;
        loop {
            match self.state {
                State::Done | State::Error => break,
                State::FieldType => {
                    let Some(&b) = input.get(pos) else { break };
                    pos += 1;
                    if b == 0 {
                        self.depth -= 1;
                        sink.close();
                        if self.depth == 0 {
                            self.state = State::Done;
                            break;
                        }
                    } else {
                        self.tag = ElementType::from_byte(b);
                        self.state = State::FieldName;
                    }
                }
                State::FieldName => match input[pos..].iter().position(|&b| b == 0) {
                    Some(i) => {
                        if i > 0 {
                            sink.field_name(&input[pos..pos + i]);
                        }
                        sink.field_name(&[]);
                        pos += i + 1;
                        self.enter_value(sink).map_err(|e| self.fail(e))?;
                    }
                    None => {
                        if pos < input.len() {
                            sink.field_name(&input[pos..]);
                        }
                        pos = input.len();
                        break;
                    }
                },
                State::ReadInt32 => {
                    if !self.fill_scratch(input, &mut pos, 4) {
                        break;
                    }
                    let v = LittleEndian::read_i32(&self.scratch[..4]);
                    self.dispatch_i32(v, sink).map_err(|e| self.fail(e))?;
                }
                State::ReadInt64 => {
                    if !self.fill_scratch(input, &mut pos, 8) {
                        break;
                    }
                    let v = LittleEndian::read_i64(&self.scratch[..8]);
                    match self.tag {
                        ElementType::Int64 => sink.int64(v),
                        ElementType::UtcDatetime => sink.utc_datetime(v),
                        ElementType::Timestamp => sink.timestamp(v),
                        _ => unreachable!("bad tag in int64 state"),
                    }
                    self.state = State::FieldType;
                }
                State::ReadDouble => {
                    if !self.fill_scratch(input, &mut pos, 8) {
                        break;
                    }
                    let v = LittleEndian::read_f64(&self.scratch[..8]);
                    sink.double(v);
                    self.state = State::FieldType;
                }
                State::ReadBool => {
                    let Some(&b) = input.get(pos) else { break };
                    pos += 1;
                    sink.boolean(b as i8 > 0);
                    self.state = State::FieldType;
                }
                State::ReadString => {
                    let avail = (input.len() - pos) as i32;
                    if avail < self.partial {
                        if avail > 0 {
                            self.dispatch_string(&input[pos..], sink);
                        }
                        self.partial -= avail;
                        pos = input.len();
                        break;
                    }
                    let take = self.partial as usize;
                    if take > 0 {
                        self.dispatch_string(&input[pos..pos + take], sink);
                    }
                    self.dispatch_string(&[], sink);
                    pos += take;
                    self.partial = 0;
                    self.state = if self.tag == ElementType::Bindata {
                        State::FieldType
                    } else {
                        State::ReadStringTerm
                    };
                }
                State::ReadStringTerm => {
                    let Some(&b) = input.get(pos) else { break };
                    pos += 1;
                    if b != 0 {
                        return Err(self.fail(Error::MissingTerminator));
                    }
                    self.state = State::FieldType;
                }
                State::ReadBinSubtype => {
                    let Some(&b) = input.get(pos) else { break };
                    pos += 1;
                    sink.bindata_subtype(BinarySubtype::from(b));
                    self.state = State::ReadString;
                }
                State::ReadObjectId => {
                    if !self.fill_scratch(input, &mut pos, OBJECT_ID_LEN) {
                        break;
                    }
                    let oid: &[u8; OBJECT_ID_LEN] = &self.scratch;
                    sink.object_id(oid);
                    self.state = State::FieldType;
                }
            }
        }
        self.bytes_seen += pos as i64;
        Ok(pos)
    }

    // Selects the value state for the tag just read. Tags with an int32
    // length or value all funnel through ReadInt32 first.
    fn enter_value<S: EventSink>(&mut self, sink: &mut S) -> Result<()> {
        match self.tag {
            ElementType::Int32
            | ElementType::Array
            | ElementType::Document
            | ElementType::Utf8
            | ElementType::Js
            | ElementType::Bindata => self.state = State::ReadInt32,
            ElementType::Int64 | ElementType::UtcDatetime | ElementType::Timestamp => {
                self.state = State::ReadInt64
            }
            ElementType::Bool => self.state = State::ReadBool,
            ElementType::Double => self.state = State::ReadDouble,
            ElementType::Null => {
                sink.null();
                self.state = State::FieldType;
            }
            ElementType::ObjectId => self.state = State::ReadObjectId,
            ElementType::Regexp | ElementType::ScopedJs => {
                return Err(Error::UnsupportedType(self.tag));
            }
            ElementType::MinKey | ElementType::MaxKey => return Err(Error::InvalidTag),
        }
        Ok(())
    }

    // Continuation once a 4-byte little-endian value is assembled: either a
    // scalar int32 or the length prefix of a container, string, or bindata.
    fn dispatch_i32<S: EventSink>(&mut self, v: i32, sink: &mut S) -> Result<()> {
        match self.tag {
            ElementType::Document => {
                self.open(sink, false)?;
            }
            ElementType::Array => {
                self.open(sink, true)?;
            }
            ElementType::Int32 => {
                sink.int32(v);
                self.state = State::FieldType;
            }
            ElementType::Utf8 | ElementType::Js => {
                if v < 1 {
                    return Err(Error::InvalidLength(v));
                }
                self.partial = v - 1;
                self.state = State::ReadString;
            }
            ElementType::Bindata => {
                if v < 0 {
                    return Err(Error::InvalidLength(v));
                }
                self.partial = v;
                self.state = State::ReadBinSubtype;
            }
            _ => unreachable!("bad tag in int32 state"),
        }
        Ok(())
    }

    fn open<S: EventSink>(&mut self, sink: &mut S, array: bool) -> Result<()> {
        if self.depth == i8::MAX {
            return Err(Error::DepthExceeded);
        }
        self.depth += 1;
        if array {
            sink.open_array();
        } else {
            sink.open_doc();
        }
        self.state = State::FieldType;
        Ok(())
    }

    fn dispatch_string<S: EventSink>(&mut self, chunk: &[u8], sink: &mut S) {
        match self.tag {
            ElementType::Utf8 => sink.utf8(chunk),
            ElementType::Js => sink.js(chunk),
            ElementType::Bindata => sink.bindata(chunk),
            _ => unreachable!("bad tag in string state"),
        }
    }

    // Accumulates up to `want` bytes into scratch across calls. Returns true
    // once scratch holds the full value.
    fn fill_scratch(&mut self, input: &[u8], pos: &mut usize, want: usize) -> bool {
        let have = self.partial as usize;
        let take = (want - have).min(input.len() - *pos);
        self.scratch[have..have + take].copy_from_slice(&input[*pos..*pos + take]);
        *pos += take;
        if have + take < want {
            self.partial = (have + take) as i32;
            false
        } else {
            self.partial = 0;
            true
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        self.state = State::Error;
        e
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        StreamParser::new()
    }
}
