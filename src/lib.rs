//! Zero-copy BSON plumbing for talking to a MongoDB-flavored document
//! database: an append-only document writer, a resumable streaming parser,
//! a borrowing random-access view, and wire-protocol framing on both sides.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! For the format itself, see [bsonspec.org](http://bsonspec.org/spec.html).
//!
//! ## Writing
//!
//! [`BsonWriter`] builds one document at a time into a contiguous buffer,
//! back-patching every nested length prefix in constant time when a
//! container is popped. Small documents never touch the heap.
//!
//! ```rust
//! use bsonwire::BsonWriter;
//!
//! let mut w = BsonWriter::new();
//! w.document();
//! w.element("hello", "world");
//! w.push_array("fib");
//! w.element(0, 1i32);
//! w.element(1, 1i32);
//! w.element(2, 2i32);
//! w.pop();
//! w.pop();
//! assert_eq!(w.data()[0] as usize, w.len());
//! ```
//!
//! ## Reading
//!
//! Two read paths share one set of semantics. [`StreamParser`] is a
//! resumable state machine that accepts byte chunks of any size from any
//! I/O loop and emits events through an [`EventSink`]; it holds no
//! references into the input between calls. [`RawValue`] borrows an
//! already-complete buffer and offers field lookup and iteration without
//! copying.
//!
//! ```rust
//! use bsonwire::{BsonWriter, RawValue};
//!
//! let mut w = BsonWriter::new();
//! w.document();
//! w.element("greeting", "hello");
//! w.pop();
//!
//! let doc = RawValue::document(w.data()).unwrap();
//! assert_eq!(doc.get_field("greeting").unwrap().as_str(), Some("hello"));
//! ```
//!
//! ## Wire protocol
//!
//! The [`wire`] module frames requests (insert, update, delete, query,
//! getMore, killCursors) around writer-built documents and parses replies:
//! [`wire::OpResponseParser`] reduces a command reply to
//! `{ok, n, nModified, errors}` in one pass with constant-memory field-name
//! matching.

pub use self::{
    error::{Error, Result},
    matcher::KeywordMatcher,
    raw::{RawIter, RawValue},
    spec::{BinarySubtype, ElementType},
    stream::{EventSink, NullSink, StreamParser},
    writer::{BsonWriter, FieldValue, Key},
};

pub mod error;
pub mod extjson;
pub mod matcher;
pub mod raw;
pub mod spec;
pub mod stream;
pub mod wire;
pub mod writer;
