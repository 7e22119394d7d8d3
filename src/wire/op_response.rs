//! Distills command replies into a small structured result.
//!
//! Write commands answer with documents shaped like
//! `{ok, n, nModified, writeErrors: [...], writeConcernErrors: [...]}`.
//! [`OpResponseParser`] recognizes the interesting field names with two
//! constant-memory [`KeywordMatcher`]s instead of buffering names, tracks
//! nesting depth, and accumulates an [`OperationResponse`]. Streaming parse
//! failures are folded into the same result as [`CmdErrorKind::ParseError`]
//! entries so callers handle every failure shape through one list.

use serde::{Deserialize, Serialize};

use super::response::{ResponseHeader, ResponseParser, ResponseSink};
use crate::{error::Result, matcher::KeywordMatcher, stream::EventSink};

/// One error reported by a command reply (or synthesized by the parser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdError {
    pub code: i32,
    /// Index of the document in the batch this error applies to.
    pub index: i32,
    pub msg: String,
    pub info: String,
    pub kind: CmdErrorKind,
}

impl CmdError {
    fn new(kind: CmdErrorKind) -> CmdError {
        CmdError {
            code: 0,
            index: 0,
            msg: String::new(),
            info: String::new(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmdErrorKind {
    WriteError,
    WriteConcernError,
    /// Not a database error: the reply itself could not be parsed.
    ParseError,
}

/// The structured result of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub ok: i32,
    pub n: i32,
    #[serde(rename = "nModified")]
    pub n_modified: i32,
    pub errors: Vec<CmdError>,
}

impl OperationResponse {
    /// Whether the reply reported failure or carried any error entries.
    pub fn is_err(&self) -> bool {
        self.ok != 1 || !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseField {
    /// A name is mid-recognition.
    Field,
    Ok,
    NModified,
    N,
    Unknown,
    WriteConcernErrors,
    WriteErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorField {
    Field,
    Index,
    ErrMsg,
    ErrInfo,
    Code,
    Unknown,
}

const BASE_FIELDS: &[(&str, BaseField)] = &[
    ("n", BaseField::N),
    ("nModified", BaseField::NModified),
    ("ok", BaseField::Ok),
    ("writeConcernErrors", BaseField::WriteConcernErrors),
    ("writeErrors", BaseField::WriteErrors),
];

const ERROR_FIELDS: &[(&str, ErrorField)] = &[
    ("code", ErrorField::Code),
    ("errInfo", ErrorField::ErrInfo),
    ("errmsg", ErrorField::ErrMsg),
    ("index", ErrorField::Index),
];

// Depth 1 is the reply's top-level fields, 2 the errors array, 3 an error
// sub-document.
struct OpSink {
    base_field: BaseField,
    error_field: ErrorField,
    depth: u8,
    base_matcher: KeywordMatcher<BaseField>,
    error_matcher: KeywordMatcher<ErrorField>,
    res: OperationResponse,
}

impl OpSink {
    fn new() -> OpSink {
        OpSink {
            base_field: BaseField::Unknown,
            error_field: ErrorField::Unknown,
            depth: 0,
            base_matcher: KeywordMatcher::new(BASE_FIELDS, BaseField::Unknown),
            error_matcher: KeywordMatcher::new(ERROR_FIELDS, ErrorField::Unknown),
            res: OperationResponse::default(),
        }
    }

    fn in_error(&self) -> bool {
        self.depth == 3
            && (self.base_field == BaseField::WriteErrors
                || self.base_field == BaseField::WriteConcernErrors)
    }
}

impl EventSink for OpSink {
    fn field_name(&mut self, chunk: &[u8]) {
        if self.depth == 1 {
            if self.base_field != BaseField::Field {
                self.base_field = BaseField::Field;
                self.base_matcher.reset();
            }
            for &b in chunk {
                self.base_matcher.add_byte(b);
            }
            if chunk.is_empty() {
                self.base_matcher.add_byte(0);
                self.base_field = self.base_matcher.result();
            }
        } else if self.in_error() {
            if self.error_field != ErrorField::Field {
                self.error_field = ErrorField::Field;
                self.error_matcher.reset();
            }
            for &b in chunk {
                self.error_matcher.add_byte(b);
            }
            if chunk.is_empty() {
                self.error_matcher.add_byte(0);
                self.error_field = self.error_matcher.result();
            }
        }
    }

    fn open_doc(&mut self) {
        self.depth += 1;
        if self.in_error() {
            let kind = if self.base_field == BaseField::WriteConcernErrors {
                CmdErrorKind::WriteConcernError
            } else {
                CmdErrorKind::WriteError
            };
            self.res.errors.push(CmdError::new(kind));
        }
    }

    fn open_array(&mut self) {
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
    }

    fn int32(&mut self, v: i32) {
        if self.depth == 1 {
            match self.base_field {
                BaseField::Ok => self.res.ok = v,
                BaseField::N => self.res.n = v,
                BaseField::NModified => self.res.n_modified = v,
                _ => {}
            }
        } else if self.in_error() {
            let Some(last) = self.res.errors.last_mut() else {
                return;
            };
            match self.error_field {
                ErrorField::Code => last.code = v,
                ErrorField::Index => last.index = v,
                _ => {}
            }
        }
    }

    fn utf8(&mut self, chunk: &[u8]) {
        if chunk.is_empty() || !self.in_error() {
            return;
        }
        let Some(last) = self.res.errors.last_mut() else {
            return;
        };
        match self.error_field {
            ErrorField::ErrMsg => last.msg.push_str(&String::from_utf8_lossy(chunk)),
            ErrorField::ErrInfo => last.info.push_str(&String::from_utf8_lossy(chunk)),
            _ => {}
        }
    }
}

impl ResponseSink for OpSink {}

/// Parses a command reply into an [`OperationResponse`].
///
/// ```
/// use bsonwire::wire::OpResponseParser;
///
/// # fn feed(reply: &[u8]) -> bsonwire::wire::OperationResponse {
/// let mut parser = OpResponseParser::new();
/// let _ = parser.consume(reply);
/// parser.into_result()
/// # }
/// ```
pub struct OpResponseParser {
    inner: ResponseParser,
    sink: OpSink,
}

impl OpResponseParser {
    pub fn new() -> OpResponseParser {
        OpResponseParser {
            inner: ResponseParser::new(),
            sink: OpSink::new(),
        }
    }

    /// Feeds a chunk of the reply. A parse failure is returned and also
    /// recorded in the result as a [`CmdErrorKind::ParseError`] entry.
    pub fn consume(&mut self, input: &[u8]) -> Result<usize> {
        match self.inner.consume(input, &mut self.sink) {
            Ok(used) => Ok(used),
            Err(e) => {
                let mut entry = CmdError::new(CmdErrorKind::ParseError);
                entry.msg = e.to_string();
                self.sink.res.errors.push(entry);
                Err(e)
            }
        }
    }

    pub fn done(&self) -> bool {
        self.inner.done()
    }

    pub fn header(&self) -> &ResponseHeader {
        self.inner.header()
    }

    pub fn result(&self) -> &OperationResponse {
        &self.sink.res
    }

    pub fn into_result(self) -> OperationResponse {
        self.sink.res
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.sink = OpSink::new();
    }
}

impl Default for OpResponseParser {
    fn default() -> Self {
        OpResponseParser::new()
    }
}
