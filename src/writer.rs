//! An append-only writer that builds a BSON document into a single
//! contiguous buffer.
//!
//! The writer owns its buffer. Small documents are assembled entirely in an
//! inline region; the buffer spills to the heap on the first growth past
//! [`INLINE_CAPACITY`] bytes. Nested documents and arrays are closed with
//! [`BsonWriter::pop`], which back-patches the container's length prefix in
//! place: no side stack is kept, because each open container's length slot
//! temporarily parks the offset of its parent's length slot.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use smallvec::SmallVec;

use crate::spec::{BinarySubtype, ElementType, OBJECT_ID_LEN};

/// Bytes available before the writer's buffer spills to the heap.
pub const INLINE_CAPACITY: usize = 240;

/// A document or array key.
///
/// Documents use string keys; arrays use non-negative integer keys rendered
/// as decimal ASCII. Passing a negative integer key is a contract violation
/// and trips a debug assertion.
pub trait Key: Copy {
    /// Length in bytes of the encoded key, excluding the terminator.
    fn encoded_len(self) -> usize;

    /// Appends the encoded key bytes, excluding the terminator.
    fn append_key(self, w: &mut BsonWriter);
}

impl Key for &str {
    fn encoded_len(self) -> usize {
        self.len()
    }

    fn append_key(self, w: &mut BsonWriter) {
        w.data.extend_from_slice(self.as_bytes());
    }
}

impl Key for i32 {
    fn encoded_len(self) -> usize {
        debug_assert!(self >= 0, "array keys must be non-negative");
        let mut n = self;
        let mut digits = 1;
        while n >= 10 {
            n /= 10;
            digits += 1;
        }
        digits
    }

    fn append_key(self, w: &mut BsonWriter) {
        debug_assert!(self >= 0, "array keys must be non-negative");
        let mut buf = [0u8; 10];
        let mut k = self;
        let mut i = buf.len();
        loop {
            i -= 1;
            buf[i] = b'0' + (k % 10) as u8;
            k /= 10;
            if k == 0 {
                break;
            }
        }
        w.data.extend_from_slice(&buf[i..]);
    }
}

/// A scalar value writable with [`BsonWriter::element`].
///
/// Value kinds whose wire tag is ambiguous for a given Rust type (datetimes,
/// timestamps, object ids, binary data, null) have dedicated `element_*`
/// methods on the writer instead.
pub trait FieldValue {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K);
}

impl FieldValue for i32 {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K) {
        w.start_field(ElementType::Int32, key, 4);
        w.data.extend_from_slice(&self.to_le_bytes());
    }
}

impl FieldValue for i64 {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K) {
        w.start_field(ElementType::Int64, key, 8);
        w.data.extend_from_slice(&self.to_le_bytes());
    }
}

impl FieldValue for f64 {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K) {
        w.start_field(ElementType::Double, key, 8);
        w.data.extend_from_slice(&self.to_le_bytes());
    }
}

impl FieldValue for bool {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K) {
        w.start_field(ElementType::Bool, key, 1);
        w.data.push(self as u8);
    }
}

impl FieldValue for &str {
    fn append_element<K: Key>(self, w: &mut BsonWriter, key: K) {
        // 4-byte length (including the trailing null) + bytes + null.
        w.start_field(ElementType::Utf8, key, 4 + self.len() + 1);
        w.data
            .extend_from_slice(&(self.len() as i32 + 1).to_le_bytes());
        w.data.extend_from_slice(self.as_bytes());
        w.data.push(0);
    }
}

/// Builds one BSON document at a time into an internally managed buffer.
///
/// ```
/// use bsonwire::BsonWriter;
///
/// let mut w = BsonWriter::new();
/// w.document();
/// w.element("a", 1i32);
/// w.pop();
/// assert_eq!(w.data(), b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00");
/// ```
pub struct BsonWriter {
    data: SmallVec<[u8; INLINE_CAPACITY]>,
    // Offset of the length slot of the innermost open container. The slot
    // itself holds the previous doc_start until `pop` patches the real
    // length in.
    doc_start: i32,
}

impl BsonWriter {
    pub fn new() -> BsonWriter {
        BsonWriter {
            data: SmallVec::new(),
            doc_start: 0,
        }
    }

    /// Resets the writer without releasing its buffer.
    pub fn clear(&mut self) {
        self.data.clear();
        self.doc_start = 0;
    }

    /// The bytes written so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the buffer still lives in the inline region.
    pub fn is_inline(&self) -> bool {
        !self.data.spilled()
    }

    /// Copies the buffer into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Opens the top-level document. Must be the first structural call on a
    /// fresh or cleared writer.
    pub fn document(&mut self) {
        self.reserve(5);
        self.start_document();
    }

    /// Opens a nested document under the current container.
    pub fn push_document<K: Key>(&mut self, key: K) {
        self.start_field(ElementType::Document, key, 10);
        self.start_document();
    }

    /// Opens a nested array under the current container. Keys inside must be
    /// increasing integers starting at 0; the writer does not check this.
    pub fn push_array<K: Key>(&mut self, key: K) {
        self.start_field(ElementType::Array, key, 10);
        self.start_document();
    }

    /// Closes the most recently opened document or array, back-patching its
    /// length prefix.
    pub fn pop(&mut self) {
        self.reserve(1);
        self.data.push(0);
        let start = self.doc_start as usize;
        let doc_len = self.data.len() as i32 - self.doc_start;
        self.doc_start = LittleEndian::read_i32(&self.data[start..start + 4]);
        LittleEndian::write_i32(&mut self.data[start..start + 4], doc_len);
    }

    /// Writes a scalar element under `key`.
    pub fn element<K: Key, V: FieldValue>(&mut self, key: K, value: V) {
        value.append_element(self, key);
    }

    /// Writes a null element.
    pub fn element_null<K: Key>(&mut self, key: K) {
        self.start_field(ElementType::Null, key, 0);
    }

    /// Writes a UTC datetime element (milliseconds or seconds are the
    /// caller's convention; the wire carries a raw i64).
    pub fn element_utc_datetime<K: Key>(&mut self, key: K, value: i64) {
        self.start_field(ElementType::UtcDatetime, key, 8);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an internal timestamp element.
    pub fn element_timestamp<K: Key>(&mut self, key: K, value: i64) {
        self.start_field(ElementType::Timestamp, key, 8);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an object-id element.
    pub fn element_object_id<K: Key>(&mut self, key: K, value: &[u8; OBJECT_ID_LEN]) {
        self.start_field(ElementType::ObjectId, key, OBJECT_ID_LEN);
        self.data.extend_from_slice(value);
    }

    /// Writes a binary element with the given subtype.
    pub fn element_bindata<K: Key>(&mut self, key: K, subtype: BinarySubtype, value: &[u8]) {
        self.start_field(ElementType::Bindata, key, 4 + 1 + value.len());
        self.data
            .extend_from_slice(&(value.len() as i32).to_le_bytes());
        self.data.push(subtype.into());
        self.data.extend_from_slice(value);
    }

    /// Appends raw bytes. Untagged; used to assemble wire-protocol framing
    /// around documents.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Appends raw bytes followed by a null terminator.
    pub fn append_cstr(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len() + 1);
        self.data.extend_from_slice(bytes);
        self.data.push(0);
    }

    /// Appends a raw little-endian i32.
    pub fn append_i32(&mut self, value: i32) {
        self.reserve(4);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a raw little-endian i64.
    pub fn append_i64(&mut self, value: i64) {
        self.reserve(8);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes the current buffer length into the first four bytes. Only
    /// meaningful when the buffer starts with an i32 length slot, as every
    /// wire message does.
    pub fn flush_len(&mut self) {
        let len = self.data.len() as i32;
        LittleEndian::write_i32(&mut self.data[0..4], len);
    }

    // Parks the previous doc_start in the new container's length slot.
    fn start_document(&mut self) {
        let pos = self.data.len() as i32;
        let parked = self.doc_start;
        self.data.extend_from_slice(&parked.to_le_bytes());
        self.doc_start = pos;
    }

    // Appends `tag ‖ key ‖ 0x00`, reserving room for the value as well.
    fn start_field<K: Key>(&mut self, tag: ElementType, key: K, value_len: usize) {
        self.reserve(1 + key.encoded_len() + 1 + value_len);
        self.data.push(tag as i8 as u8);
        key.append_key(self);
        self.data.push(0);
    }

    // Growth policy: new capacity = max(2·cap, cap + extra + 2).
    fn reserve(&mut self, extra: usize) {
        let cap = self.data.capacity();
        if self.data.len() + extra > cap {
            let new_cap = std::cmp::max(2 * cap, cap + extra + 2);
            self.data.reserve_exact(new_cap - self.data.len());
        }
    }
}

impl Default for BsonWriter {
    fn default() -> Self {
        BsonWriter::new()
    }
}

impl fmt::Debug for BsonWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BsonWriter")
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}
