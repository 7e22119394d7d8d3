//! Renders parse events as MongoDB extended JSON.
//!
//! [`JsonDumper`] is an [`EventSink`] (and [`ResponseSink`]) that appends
//! extended-JSON text to an internal string as events arrive, so it can sit
//! directly behind either the streaming parser or a response parser.
//! [`print_value`] drives the same sink from a [`RawValue`], which makes the
//! two read paths directly comparable:
//!
//! ```
//! use bsonwire::{extjson, BsonWriter, RawValue, StreamParser};
//!
//! let mut w = BsonWriter::new();
//! w.document();
//! w.element("a", 1i32);
//! w.pop();
//!
//! let mut streamed = extjson::JsonDumper::new();
//! StreamParser::new().consume(w.data(), &mut streamed).unwrap();
//!
//! let mut walked = extjson::JsonDumper::new();
//! extjson::print_value(&RawValue::document(w.data()).unwrap(), &mut walked);
//!
//! assert_eq!(streamed.as_str(), walked.as_str());
//! ```

use std::fmt::Write as _;

use crate::{
    raw::RawValue,
    spec::{BinarySubtype, ElementType, OBJECT_ID_LEN},
    stream::EventSink,
    wire::{ResponseHeader, ResponseSink},
};

/// Accumulates extended-JSON text from parse events.
pub struct JsonDumper {
    out: String,
    stack: Vec<ElementType>,
    in_lit: bool,
    first_elt: bool,
    subtype: BinarySubtype,
}

impl JsonDumper {
    pub fn new() -> JsonDumper {
        JsonDumper {
            out: String::new(),
            stack: Vec::new(),
            in_lit: false,
            first_elt: true,
            subtype: BinarySubtype::Generic,
        }
    }

    /// The text rendered so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn clear(&mut self) {
        self.out.clear();
        self.stack.clear();
        self.in_lit = false;
        self.first_elt = true;
    }

    fn in_array(&self) -> bool {
        self.stack.last() == Some(&ElementType::Array)
    }

    // Escapes a fragment of string or binary content. Non-printable bytes
    // come out as \xNN, as the shell-debugging tradition has it.
    fn print_frag(&mut self, chunk: &[u8]) {
        for &b in chunk {
            match b {
                b'\n' => self.out.push_str("\\n"),
                b'\t' => self.out.push_str("\\t"),
                b'"' => self.out.push_str("\\\""),
                0x20..=0x7E => self.out.push(b as char),
                _ => {
                    let _ = write!(self.out, "\\x{:02x}", b);
                }
            }
        }
    }

    fn print_nl(&mut self, pop: bool) {
        if !pop && !self.first_elt {
            self.out.push(',');
        }
        self.first_elt = false;
        self.out.push('\n');
        for _ in 0..2 * self.stack.len() {
            self.out.push(' ');
        }
    }
}

impl Default for JsonDumper {
    fn default() -> Self {
        JsonDumper::new()
    }
}

impl EventSink for JsonDumper {
    fn open_doc(&mut self) {
        self.stack.push(ElementType::Document);
        self.out.push('{');
        self.first_elt = true;
    }

    fn open_array(&mut self) {
        self.stack.push(ElementType::Array);
        self.out.push('[');
        self.first_elt = true;
    }

    fn close(&mut self) {
        let c = if self.in_array() { ']' } else { '}' };
        self.stack.pop();
        self.print_nl(true);
        self.out.push(c);
        if self.stack.is_empty() {
            self.out.push('\n');
        }
    }

    fn field_name(&mut self, chunk: &[u8]) {
        if !self.in_lit {
            self.print_nl(false);
        }
        if !self.in_array() {
            if !self.in_lit {
                self.out.push('"');
            }
            self.print_frag(chunk);
            if chunk.is_empty() {
                self.out.push_str("\": ");
            }
        }
        self.in_lit = !chunk.is_empty();
    }

    fn int32(&mut self, v: i32) {
        let _ = write!(self.out, "{}", v);
    }

    fn int64(&mut self, v: i64) {
        let _ = write!(self.out, "{{ \"$numberLong\": \"{}\" }}", v);
    }

    fn double(&mut self, v: f64) {
        let _ = write!(self.out, "{}", v);
    }

    fn boolean(&mut self, v: bool) {
        self.out.push_str(if v { "true" } else { "false" });
    }

    fn null(&mut self) {
        self.out.push_str("null");
    }

    fn utf8(&mut self, chunk: &[u8]) {
        if !self.in_lit {
            self.out.push('"');
            self.in_lit = true;
        }
        self.print_frag(chunk);
        if chunk.is_empty() {
            self.out.push('"');
            self.in_lit = false;
        }
    }

    fn js(&mut self, chunk: &[u8]) {
        if !self.in_lit {
            self.out.push_str("{ \"$code\": \"");
            self.in_lit = true;
        }
        self.print_frag(chunk);
        if chunk.is_empty() {
            self.out.push_str("\" }");
            self.in_lit = false;
        }
    }

    fn bindata_subtype(&mut self, subtype: BinarySubtype) {
        self.subtype = subtype;
        self.out.push_str("{ \"$binary\": \"");
    }

    fn bindata(&mut self, chunk: &[u8]) {
        self.print_frag(chunk);
        if chunk.is_empty() {
            let _ = write!(self.out, "\", \"$type\": \"{:02x}\" }}", self.subtype);
        }
    }

    fn utc_datetime(&mut self, v: i64) {
        // Seconds since the epoch; anything unrepresentable falls back to
        // the numeric form.
        self.out.push_str("{ \"$date\": ");
        let formatted = if v >= 0 {
            chrono::DateTime::from_timestamp(v, 0)
        } else {
            None
        };
        match formatted {
            Some(dt) => {
                let _ = write!(self.out, "\"{}\"", dt.format("%Y-%m-%dT%H:%M:%SZ"));
            }
            None => self.int64(v),
        }
        self.out.push_str(" }");
    }

    fn timestamp(&mut self, v: i64) {
        let seconds = v as u32;
        let increments = (v >> 32) as u32;
        let _ = write!(
            self.out,
            "{{ \"$timestamp\": {{ \"i\": {}, \"s\": {} }}}}",
            increments, seconds
        );
    }

    fn object_id(&mut self, bytes: &[u8; OBJECT_ID_LEN]) {
        let _ = write!(self.out, "{{ \"$oid\": \"{}\" }}", hex::encode(bytes));
    }
}

impl ResponseSink for JsonDumper {
    fn start(&mut self, header: &ResponseHeader) {
        let _ = writeln!(self.out, "flags: {}", header.response_flags);
    }

    fn document_start(&mut self, index: i32) {
        if index > 0 {
            self.out.push_str("=================\n");
        }
    }
}

/// Renders a [`RawValue`] by recursively walking it and driving `d` with
/// the same events the streaming parser would emit. Returns false if a
/// value with an unsupported tag was encountered (it is skipped).
pub fn print_value(value: &RawValue<'_>, d: &mut JsonDumper) -> bool {
    match value.tag() {
        ElementType::Double => match value.as_f64() {
            Some(v) => {
                d.double(v);
                true
            }
            None => false,
        },
        ElementType::Int32 => match value.as_i32() {
            Some(v) => {
                d.int32(v);
                true
            }
            None => false,
        },
        ElementType::Int64 => match value.as_i64() {
            Some(v) => {
                d.int64(v);
                true
            }
            None => false,
        },
        ElementType::UtcDatetime => match value.as_utc_datetime() {
            Some(v) => {
                d.utc_datetime(v);
                true
            }
            None => false,
        },
        ElementType::Timestamp => match value.as_timestamp() {
            Some(v) => {
                d.timestamp(v);
                true
            }
            None => false,
        },
        ElementType::Bool => match value.as_bool() {
            Some(v) => {
                d.boolean(v);
                true
            }
            None => false,
        },
        ElementType::Null => {
            d.null();
            true
        }
        ElementType::Document | ElementType::Array => {
            if value.tag() == ElementType::Array {
                d.open_array();
            } else {
                d.open_doc();
            }
            let mut ok = true;
            for (key, child) in value.iter() {
                d.field_name(key);
                d.field_name(&[]);
                ok = print_value(&child, d) && ok;
            }
            d.close();
            ok
        }
        ElementType::ObjectId => match value.as_object_id() {
            Some(v) => {
                d.object_id(v);
                true
            }
            None => false,
        },
        ElementType::Utf8 => {
            let payload = value.payload();
            if !payload.is_empty() {
                d.utf8(payload);
            }
            d.utf8(&[]);
            true
        }
        ElementType::Js => {
            let payload = value.payload();
            if !payload.is_empty() {
                d.js(payload);
            }
            d.js(&[]);
            true
        }
        ElementType::Bindata => match value.as_bindata() {
            Some((subtype, payload)) => {
                d.bindata_subtype(subtype);
                if !payload.is_empty() {
                    d.bindata(payload);
                }
                d.bindata(&[]);
                true
            }
            None => false,
        },
        ElementType::Regexp
        | ElementType::ScopedJs
        | ElementType::MinKey
        | ElementType::MaxKey => false,
    }
}
