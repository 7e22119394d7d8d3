//! BSON element tags and binary subtypes as they appear on the wire.
//!
//! See <http://bsonspec.org/spec.html> for the binary layout each tag implies.

use std::fmt;

/// Size (in bytes) of an object id.
pub const OBJECT_ID_LEN: usize = 12;

pub const ELEMENT_TYPE_DOUBLE: u8 = 0x01;
pub const ELEMENT_TYPE_UTF8: u8 = 0x02;
pub const ELEMENT_TYPE_DOCUMENT: u8 = 0x03;
pub const ELEMENT_TYPE_ARRAY: u8 = 0x04;
pub const ELEMENT_TYPE_BINDATA: u8 = 0x05;
pub const ELEMENT_TYPE_OBJECT_ID: u8 = 0x07;
pub const ELEMENT_TYPE_BOOL: u8 = 0x08;
pub const ELEMENT_TYPE_UTC_DATETIME: u8 = 0x09;
pub const ELEMENT_TYPE_NULL: u8 = 0x0A;
pub const ELEMENT_TYPE_REGEXP: u8 = 0x0B;
pub const ELEMENT_TYPE_JS: u8 = 0x0D;
pub const ELEMENT_TYPE_SCOPED_JS: u8 = 0x0F;
pub const ELEMENT_TYPE_INT32: u8 = 0x10;
pub const ELEMENT_TYPE_TIMESTAMP: u8 = 0x11;
pub const ELEMENT_TYPE_INT64: u8 = 0x12;
pub const ELEMENT_TYPE_MIN_KEY: u8 = 0xFF;
pub const ELEMENT_TYPE_MAX_KEY: u8 = 0x7F;

pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;
pub const BINARY_SUBTYPE_FUNCTION: u8 = 0x01;
pub const BINARY_SUBTYPE_BINARY_OLD: u8 = 0x02;
pub const BINARY_SUBTYPE_UUID_OLD: u8 = 0x03;
pub const BINARY_SUBTYPE_UUID: u8 = 0x04;
pub const BINARY_SUBTYPE_MD5: u8 = 0x05;

/// The type discriminator carried by every document element.
///
/// The wire encodes tags as signed bytes: `MinKey` is `0xFF` on the wire but
/// −1 as a signed value, and it doubles as the canonical "invalid" sentinel
/// that [`ElementType::from_byte`] folds unrecognized bytes into.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Double = ELEMENT_TYPE_DOUBLE as i8,
    Utf8 = ELEMENT_TYPE_UTF8 as i8,
    Document = ELEMENT_TYPE_DOCUMENT as i8,
    Array = ELEMENT_TYPE_ARRAY as i8,
    Bindata = ELEMENT_TYPE_BINDATA as i8,
    ObjectId = ELEMENT_TYPE_OBJECT_ID as i8,
    Bool = ELEMENT_TYPE_BOOL as i8,
    UtcDatetime = ELEMENT_TYPE_UTC_DATETIME as i8,
    Null = ELEMENT_TYPE_NULL as i8,
    /// Regular expression. Recognized but not supported.
    Regexp = ELEMENT_TYPE_REGEXP as i8,
    /// Javascript code.
    Js = ELEMENT_TYPE_JS as i8,
    /// Scoped javascript code. Recognized but not supported.
    ScopedJs = ELEMENT_TYPE_SCOPED_JS as i8,
    Int32 = ELEMENT_TYPE_INT32 as i8,
    /// Internal mongo timestamp. Use a `UtcDatetime` for wall-clock time.
    Timestamp = ELEMENT_TYPE_TIMESTAMP as i8,
    Int64 = ELEMENT_TYPE_INT64 as i8,
    MinKey = -1,
    MaxKey = ELEMENT_TYPE_MAX_KEY as i8,
}

impl ElementType {
    /// Decodes a raw tag byte, folding anything unrecognized (including the
    /// min/max key bytes themselves) into [`ElementType::MinKey`].
    #[inline]
    pub fn from_byte(b: u8) -> ElementType {
        use self::ElementType::*;
        match b {
            ELEMENT_TYPE_DOUBLE => Double,
            ELEMENT_TYPE_UTF8 => Utf8,
            ELEMENT_TYPE_DOCUMENT => Document,
            ELEMENT_TYPE_ARRAY => Array,
            ELEMENT_TYPE_BINDATA => Bindata,
            ELEMENT_TYPE_OBJECT_ID => ObjectId,
            ELEMENT_TYPE_BOOL => Bool,
            ELEMENT_TYPE_UTC_DATETIME => UtcDatetime,
            ELEMENT_TYPE_NULL => Null,
            ELEMENT_TYPE_REGEXP => Regexp,
            ELEMENT_TYPE_JS => Js,
            ELEMENT_TYPE_SCOPED_JS => ScopedJs,
            ELEMENT_TYPE_INT32 => Int32,
            ELEMENT_TYPE_TIMESTAMP => Timestamp,
            ELEMENT_TYPE_INT64 => Int64,
            _ => MinKey,
        }
    }
}

/// Subtype for binary data.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BinarySubtype {
    Generic,
    Function,
    /// Binary (old). Deprecated in favor of `Generic`; the payload carries
    /// its own int32 length prefix.
    BinaryOld,
    /// UUID (old). Deprecated in favor of `Uuid`.
    UuidOld,
    Uuid,
    Md5,
    /// User-defined subtypes live in `0x80..=0xFF`.
    UserDefined(u8),
}

impl From<BinarySubtype> for u8 {
    #[inline]
    fn from(t: BinarySubtype) -> u8 {
        match t {
            BinarySubtype::Generic => BINARY_SUBTYPE_GENERIC,
            BinarySubtype::Function => BINARY_SUBTYPE_FUNCTION,
            BinarySubtype::BinaryOld => BINARY_SUBTYPE_BINARY_OLD,
            BinarySubtype::UuidOld => BINARY_SUBTYPE_UUID_OLD,
            BinarySubtype::Uuid => BINARY_SUBTYPE_UUID,
            BinarySubtype::Md5 => BINARY_SUBTYPE_MD5,
            BinarySubtype::UserDefined(x) => x,
        }
    }
}

impl From<u8> for BinarySubtype {
    #[inline]
    fn from(t: u8) -> BinarySubtype {
        match t {
            BINARY_SUBTYPE_GENERIC => BinarySubtype::Generic,
            BINARY_SUBTYPE_FUNCTION => BinarySubtype::Function,
            BINARY_SUBTYPE_BINARY_OLD => BinarySubtype::BinaryOld,
            BINARY_SUBTYPE_UUID_OLD => BinarySubtype::UuidOld,
            BINARY_SUBTYPE_UUID => BinarySubtype::Uuid,
            BINARY_SUBTYPE_MD5 => BinarySubtype::Md5,
            _ => BinarySubtype::UserDefined(t),
        }
    }
}

impl fmt::LowerHex for BinarySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: u8 = (*self).into();
        fmt::LowerHex::fmt(&value, f)
    }
}
