use byteorder::{ByteOrder, LittleEndian};

use super::{value_size, RawIter};
use crate::spec::{BinarySubtype, ElementType, OBJECT_ID_LEN};

/// A non-owning view of one serialized value.
///
/// Typed accessors are soft-failure: they return `None` when the view's tag
/// does not match, never an error. Callers that know the schema chain the
/// accessor directly; callers that do not check [`RawValue::tag`] first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawValue<'a> {
    data: &'a [u8],
    tag: ElementType,
}

impl<'a> RawValue<'a> {
    /// Views `data` as a serialized document, validating the length prefix
    /// and terminator.
    pub fn document(data: &'a [u8]) -> Option<RawValue<'a>> {
        RawValue::new(data, ElementType::Document)
    }

    /// Views the front of `data` as a value of the given type. The view is
    /// trimmed to the value's exact size; `None` if the bytes cannot hold
    /// one.
    pub fn new(data: &'a [u8], tag: ElementType) -> Option<RawValue<'a>> {
        let size = value_size(tag, data)?;
        Some(RawValue {
            data: &data[..size],
            tag,
        })
    }

    // For the iterator, which has already sized the slice.
    pub(crate) fn from_parts(data: &'a [u8], tag: ElementType) -> RawValue<'a> {
        RawValue { data, tag }
    }

    pub fn tag(&self) -> ElementType {
        self.tag
    }

    /// The value's full serialized bytes (length prefixes and terminators
    /// included).
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The payload bytes: string content without its length prefix and
    /// terminator, bindata content without its length and subtype, otherwise
    /// the raw value bytes.
    pub fn payload(&self) -> &'a [u8] {
        match self.tag {
            ElementType::Utf8 | ElementType::Js => &self.data[4..self.data.len() - 1],
            ElementType::Bindata => &self.data[5..],
            _ => self.data,
        }
    }

    /// String content of a utf8 or js value, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.tag {
            ElementType::Utf8 | ElementType::Js => std::str::from_utf8(self.payload()).ok(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.tag {
            ElementType::Int32 => Some(LittleEndian::read_i32(self.data)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.tag {
            ElementType::Int64 => Some(LittleEndian::read_i64(self.data)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.tag {
            ElementType::Double => Some(LittleEndian::read_f64(self.data)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.tag {
            ElementType::Bool => Some(self.data[0] as i8 > 0),
            _ => None,
        }
    }

    pub fn as_utc_datetime(&self) -> Option<i64> {
        match self.tag {
            ElementType::UtcDatetime => Some(LittleEndian::read_i64(self.data)),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match self.tag {
            ElementType::Timestamp => Some(LittleEndian::read_i64(self.data)),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&'a [u8; OBJECT_ID_LEN]> {
        match self.tag {
            ElementType::ObjectId => self.data.try_into().ok(),
            _ => None,
        }
    }

    /// Subtype and payload of a bindata value.
    pub fn as_bindata(&self) -> Option<(BinarySubtype, &'a [u8])> {
        match self.tag {
            ElementType::Bindata => Some((BinarySubtype::from(self.data[4]), self.payload())),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.tag == ElementType::Null
    }

    /// Finds the first field named `name` by walking the document linearly,
    /// comparing keys byte-wise. `None` for absent fields, for malformed
    /// documents, and for non-document views. Repeated lookups should walk
    /// [`RawValue::iter`] once instead.
    pub fn get_field(&self, name: &str) -> Option<RawValue<'a>> {
        if self.tag != ElementType::Document {
            return None;
        }
        self.iter()
            .find(|(key, _)| *key == name.as_bytes())
            .map(|(_, value)| value)
    }

    /// Iterates the fields of a document or array. For any other tag the
    /// iterator is immediately exhausted.
    pub fn iter(&self) -> RawIter<'a> {
        RawIter::new(self)
    }
}
