use super::{value_size, RawValue};
use crate::spec::ElementType;

/// An iterator over a document's or array's entries.
///
/// Yields `(key, value)` pairs in document order; the key is the
/// null-terminated name's bytes (terminator excluded) borrowed from the
/// parent buffer. The iterator exhausts itself at the document terminator or
/// at the first malformed element, whichever comes first: malformed input is
/// indistinguishable from the end of iteration by design.
pub struct RawIter<'a> {
    data: &'a [u8],
    offset: usize,
    valid: bool,
}

impl<'a> RawIter<'a> {
    pub(crate) fn new(value: &RawValue<'a>) -> RawIter<'a> {
        match value.tag() {
            ElementType::Document | ElementType::Array => RawIter {
                data: value.as_bytes(),
                offset: 4,
                valid: true,
            },
            _ => RawIter {
                data: &[],
                offset: 0,
                valid: false,
            },
        }
    }

    fn invalidate(&mut self) -> Option<(&'a [u8], RawValue<'a>)> {
        self.valid = false;
        None
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = (&'a [u8], RawValue<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.valid {
            return None;
        }
        // The last byte is the container terminator; an element cannot
        // start there or beyond.
        if self.offset + 1 >= self.data.len() {
            return self.invalidate();
        }
        let tag = ElementType::from_byte(self.data[self.offset]);
        if tag == ElementType::MinKey {
            // Either the terminator (0x00) or a corrupt tag byte.
            return self.invalidate();
        }

        let key_start = self.offset + 1;
        let key_len = match self.data[key_start..self.data.len() - 1]
            .iter()
            .position(|&b| b == 0)
        {
            Some(i) => i,
            None => return self.invalidate(),
        };
        let key = &self.data[key_start..key_start + key_len];

        let value_start = key_start + key_len + 1;
        let avail = &self.data[value_start..self.data.len() - 1];
        let size = match value_size(tag, avail) {
            Some(s) => s,
            None => return self.invalidate(),
        };

        let value = RawValue::from_parts(&self.data[value_start..value_start + size], tag);
        self.offset = value_start + size;
        Some((key, value))
    }
}
