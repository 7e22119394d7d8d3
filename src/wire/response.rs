//! Response-side framing: the fixed message header and the parsers that
//! drive document payloads out of it.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    raw::RawValue,
    stream::{EventSink, StreamParser},
};

/// Byte length of the packed response header.
pub const RESPONSE_HEADER_LEN: usize = 36;

/// The fixed header preceding every response from the database.
///
/// All fields are packed little-endian on the wire, message header first,
/// reply fields after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResponseHeader {
    /// Total message size, including this header.
    pub message_length: i32,
    pub request_id: i32,
    /// The request id this message replies to.
    pub response_to: i32,
    pub op_code: i32,
    /// Bit vector of `RESPONSE_FLAG_*` values.
    pub response_flags: i32,
    /// Cursor id to pass to getMore, or 0.
    pub cursor_id: i64,
    /// Position in the cursor this reply starts from.
    pub starting_from: i32,
    /// Number of documents in this reply.
    pub number_returned: i32,
}

impl ResponseHeader {
    pub fn from_bytes(buf: &[u8; RESPONSE_HEADER_LEN]) -> ResponseHeader {
        ResponseHeader {
            message_length: LittleEndian::read_i32(&buf[0..4]),
            request_id: LittleEndian::read_i32(&buf[4..8]),
            response_to: LittleEndian::read_i32(&buf[8..12]),
            op_code: LittleEndian::read_i32(&buf[12..16]),
            response_flags: LittleEndian::read_i32(&buf[16..20]),
            cursor_id: LittleEndian::read_i64(&buf[20..28]),
            starting_from: LittleEndian::read_i32(&buf[28..32]),
            number_returned: LittleEndian::read_i32(&buf[32..36]),
        }
    }
}

// Reassembles the fixed header across chunk boundaries.
struct HeaderBuf {
    buf: [u8; RESPONSE_HEADER_LEN],
    filled: usize,
}

impl Default for HeaderBuf {
    fn default() -> Self {
        HeaderBuf {
            buf: [0u8; RESPONSE_HEADER_LEN],
            filled: 0,
        }
    }
}

impl HeaderBuf {
    // Consumes bytes from `input` starting at `*pos`; Some once complete.
    fn fill(&mut self, input: &[u8], pos: &mut usize) -> Option<ResponseHeader> {
        let take = (RESPONSE_HEADER_LEN - self.filled).min(input.len() - *pos);
        self.buf[self.filled..self.filled + take].copy_from_slice(&input[*pos..*pos + take]);
        self.filled += take;
        *pos += take;
        if self.filled == RESPONSE_HEADER_LEN {
            Some(ResponseHeader::from_bytes(&self.buf))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.filled = 0;
    }
}

/// Framing events a response consumer receives on top of the document
/// events of its [`EventSink`].
pub trait ResponseSink: EventSink {
    /// The header has been read; documents follow.
    fn start(&mut self, _header: &ResponseHeader) {}

    /// Document `index` of the reply begins.
    fn document_start(&mut self, _index: i32) {}

    /// The current document ended.
    fn document_done(&mut self) {}

    /// Every document of the reply has been read.
    fn stop(&mut self) {}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Documents,
    Done,
    Error,
}

/// Parses a complete wire response: header, then `number_returned`
/// documents streamed through the sink.
///
/// Reentrant in the same way as [`StreamParser`]: feed chunks as they
/// arrive; the parser suspends between calls. An `Err` latches it.
pub struct ResponseParser {
    phase: Phase,
    header_buf: HeaderBuf,
    header: ResponseHeader,
    doc_count: i32,
    parser: StreamParser,
}

impl ResponseParser {
    pub fn new() -> ResponseParser {
        ResponseParser {
            phase: Phase::Header,
            header_buf: HeaderBuf::default(),
            header: ResponseHeader::default(),
            doc_count: 0,
            parser: StreamParser::new(),
        }
    }

    pub fn clear(&mut self) {
        self.phase = Phase::Header;
        self.header_buf.reset();
        self.header = ResponseHeader::default();
        self.doc_count = 0;
        self.parser.clear();
    }

    /// The header of the response being (or last) parsed.
    pub fn header(&self) -> &ResponseHeader {
        &self.header
    }

    pub fn done(&self) -> bool {
        self.phase == Phase::Done || self.phase == Phase::Error
    }

    /// Feeds a chunk, returning how many of its bytes were consumed.
    pub fn consume<S: ResponseSink>(&mut self, input: &[u8], sink: &mut S) -> Result<usize> {
        let mut pos = 0usize;
        loop {
            match self.phase {
                Phase::Done | Phase::Error => return Ok(pos),
                Phase::Header => {
                    let Some(header) = self.header_buf.fill(input, &mut pos) else {
                        return Ok(pos);
                    };
                    self.header = header;
                    sink.start(&self.header);
                    self.phase = Phase::Documents;
                    self.next_document(sink);
                }
                Phase::Documents => {
                    if pos == input.len() {
                        return Ok(pos);
                    }
                    let used = match self.parser.consume(&input[pos..], sink) {
                        Ok(used) => used,
                        Err(e) => {
                            self.phase = Phase::Error;
                            return Err(e);
                        }
                    };
                    pos += used;
                    if self.parser.done() {
                        sink.document_done();
                        self.next_document(sink);
                    } else {
                        return Ok(pos);
                    }
                }
            }
        }
    }

    fn next_document<S: ResponseSink>(&mut self, sink: &mut S) {
        if self.doc_count != self.header.number_returned {
            sink.document_start(self.doc_count);
            self.doc_count += 1;
            self.parser.clear();
        } else {
            sink.stop();
            self.phase = Phase::Done;
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        ResponseParser::new()
    }
}

/// Receiver for whole-document response parsing; see
/// [`ValueResponseParser`].
pub trait ValueSink {
    /// The header has been read; documents follow.
    fn start(&mut self, _header: &ResponseHeader) {}

    /// Document `index` of the reply, as a random-access view over the
    /// parser's internal buffer. The view is only valid for this call.
    fn document_value(&mut self, index: i32, value: &RawValue<'_>);

    /// Every document of the reply has been read.
    fn stop(&mut self) {}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ValuePhase {
    Header,
    DocLen,
    DocBody,
    Done,
    Error,
}

/// A response parser that buffers each returned document whole and hands it
/// to the sink as a [`RawValue`], for consumers that want random access
/// instead of an event stream.
pub struct ValueResponseParser {
    phase: ValuePhase,
    header_buf: HeaderBuf,
    header: ResponseHeader,
    doc_count: i32,
    len_buf: [u8; 4],
    len_filled: usize,
    remaining: usize,
    buf: Vec<u8>,
}

impl ValueResponseParser {
    pub fn new() -> ValueResponseParser {
        ValueResponseParser {
            phase: ValuePhase::Header,
            header_buf: HeaderBuf::default(),
            header: ResponseHeader::default(),
            doc_count: 0,
            len_buf: [0; 4],
            len_filled: 0,
            remaining: 0,
            buf: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.phase = ValuePhase::Header;
        self.header_buf.reset();
        self.header = ResponseHeader::default();
        self.doc_count = 0;
        self.len_filled = 0;
        self.remaining = 0;
        self.buf.clear();
    }

    pub fn header(&self) -> &ResponseHeader {
        &self.header
    }

    pub fn done(&self) -> bool {
        self.phase == ValuePhase::Done || self.phase == ValuePhase::Error
    }

    pub fn consume<S: ValueSink>(&mut self, input: &[u8], sink: &mut S) -> Result<usize> {
        let mut pos = 0usize;
        loop {
            match self.phase {
                ValuePhase::Done | ValuePhase::Error => return Ok(pos),
                ValuePhase::Header => {
                    let Some(header) = self.header_buf.fill(input, &mut pos) else {
                        return Ok(pos);
                    };
                    self.header = header;
                    sink.start(&self.header);
                    self.next_document(sink);
                }
                ValuePhase::DocLen => {
                    let take = (4 - self.len_filled).min(input.len() - pos);
                    self.len_buf[self.len_filled..self.len_filled + take]
                        .copy_from_slice(&input[pos..pos + take]);
                    self.len_filled += take;
                    pos += take;
                    if self.len_filled < 4 {
                        return Ok(pos);
                    }
                    let len = LittleEndian::read_i32(&self.len_buf);
                    if len < 5 {
                        return Err(self.fail(Error::InvalidLength(len)));
                    }
                    self.buf.clear();
                    self.buf.reserve(len as usize);
                    self.buf.extend_from_slice(&self.len_buf);
                    self.len_filled = 0;
                    self.remaining = len as usize - 4;
                    self.phase = ValuePhase::DocBody;
                }
                ValuePhase::DocBody => {
                    let take = self.remaining.min(input.len() - pos);
                    self.buf.extend_from_slice(&input[pos..pos + take]);
                    self.remaining -= take;
                    pos += take;
                    if self.remaining > 0 {
                        return Ok(pos);
                    }
                    // Length and prefix are already known good; only the
                    // terminator can still be wrong.
                    if self.buf.last() != Some(&0) {
                        return Err(self.fail(Error::MissingTerminator));
                    }
                    let index = self.doc_count - 1;
                    if let Some(value) = RawValue::document(&self.buf) {
                        sink.document_value(index, &value);
                    }
                    self.next_document(sink);
                }
            }
        }
    }

    fn next_document<S: ValueSink>(&mut self, sink: &mut S) {
        if self.doc_count != self.header.number_returned {
            self.doc_count += 1;
            self.phase = ValuePhase::DocLen;
        } else {
            sink.stop();
            self.phase = ValuePhase::Done;
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        self.phase = ValuePhase::Error;
        e
    }
}

impl Default for ValueResponseParser {
    fn default() -> Self {
        ValueResponseParser::new()
    }
}
