//! Borrowing, random-access views over already-serialized documents.
//!
//! A [`RawValue`] is a non-owning view of one serialized value: a slice of
//! the value's bytes plus its element tag. Construction validates only the
//! outermost size rule for the tag; nested structure is checked lazily as it
//! is walked, and malformed bytes surface as `None` results or exhausted
//! iterators rather than errors.
//!
//! ```
//! use bsonwire::{BsonWriter, RawValue};
//!
//! let mut w = BsonWriter::new();
//! w.document();
//! w.element("greeting", "hello");
//! w.pop();
//!
//! let doc = RawValue::document(w.data()).unwrap();
//! assert_eq!(doc.get_field("greeting").unwrap().as_str(), Some("hello"));
//! assert!(doc.get_field("missing").is_none());
//! ```

mod iter;
mod value;

pub use self::{iter::RawIter, value::RawValue};

use byteorder::{ByteOrder, LittleEndian};

use crate::spec::{ElementType, OBJECT_ID_LEN};

/// Minimum byte length of a serialized document: length prefix + terminator.
pub(crate) const MIN_DOCUMENT_LEN: usize = 5;

// Size in bytes of the value starting at `data`, per its tag's size rule, or
// None when the bytes cannot hold a well-formed value of that type.
pub(crate) fn value_size(tag: ElementType, data: &[u8]) -> Option<usize> {
    use self::ElementType::*;
    let (size, null_terminated) = match tag {
        Document | Array => {
            if data.len() < MIN_DOCUMENT_LEN {
                return None;
            }
            let len = LittleEndian::read_i32(&data[..4]);
            if len < MIN_DOCUMENT_LEN as i32 {
                return None;
            }
            (len as usize, true)
        }
        Utf8 | Js => {
            if data.len() < 5 {
                return None;
            }
            let len = LittleEndian::read_i32(&data[..4]);
            if len < 1 {
                return None;
            }
            (len as usize + 4, true)
        }
        Bindata => {
            if data.len() < 5 {
                return None;
            }
            let len = LittleEndian::read_i32(&data[..4]);
            if len < 0 {
                return None;
            }
            (len as usize + 5, false)
        }
        Double | Int64 | UtcDatetime | Timestamp => (8, false),
        ObjectId => (OBJECT_ID_LEN, false),
        Bool => (1, false),
        Int32 => (4, false),
        Null => (0, false),
        Regexp | ScopedJs | MinKey | MaxKey => return None,
    };
    if size > data.len() {
        return None;
    }
    if null_terminated && data[size - 1] != 0 {
        return None;
    }
    Some(size)
}
