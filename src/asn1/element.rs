//! The tagged element: one tag byte, an explicit length, and the value bytes.
//!
//! A constructed element keeps its children encoded inside `value`. Children
//! are only ever decoded from that slice, so a tag inside one element has no
//! relation to the same tag byte at another nesting level.

use crate::error::DecodingError;

/// Bit set in the tag byte of constructed elements.
const CONSTRUCTED_BIT: u8 = 0x20;
/// Low five bits all set mean a multi-byte tag follows.
const HIGH_TAG_NUMBER: u8 = 0x1F;
/// Long-form length marker (also the indefinite-length byte on its own).
const LONG_FORM_BIT: u8 = 0x80;
/// Largest number of long-form length bytes accepted.
const MAX_LENGTH_BYTES: u8 = 4;

/// A single type-length-value element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    tag: u8,
    value: Vec<u8>,
}

impl Element {
    /// Create an element from a tag and raw value bytes.
    pub fn new(tag: u8, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Create a constructed element whose value is the concatenated encoding
    /// of `children`, in order.
    pub fn constructed(tag: u8, children: &[Element]) -> Self {
        let capacity = children.iter().map(Element::encoded_len).sum();
        let mut value = Vec::with_capacity(capacity);
        for child in children {
            child.encode_into(&mut value);
        }
        Self { tag, value }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Whether the tag byte marks this element as constructed.
    pub fn is_constructed(&self) -> bool {
        self.tag & CONSTRUCTED_BIT != 0
    }

    /// Number of bytes `encode()` will produce.
    pub fn encoded_len(&self) -> usize {
        1 + length_header_len(self.value.len()) + self.value.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Append the encoding of this element to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.tag);
        encode_length(self.value.len(), out);
        out.extend_from_slice(&self.value);
    }

    /// Decode the element at the start of `bytes`.
    ///
    /// Returns the element and the number of bytes it occupied. Bytes after
    /// that point belong to the next sibling and are left untouched.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodingError> {
        let (&tag, rest) = bytes.split_first().ok_or(DecodingError::Empty)?;
        if tag & HIGH_TAG_NUMBER == HIGH_TAG_NUMBER {
            return Err(DecodingError::MultiByteTag { tag });
        }

        let (length, length_bytes) = decode_length(rest)?;
        let header = 1 + length_bytes;
        let available = bytes.len() - header;
        if length > available {
            return Err(DecodingError::Truncated {
                declared: length,
                available,
            });
        }

        let value = bytes[header..header + length].to_vec();
        Ok((Self { tag, value }, header + length))
    }

    /// Decode an element that must occupy all of `bytes`.
    pub fn decode_exact(bytes: &[u8]) -> Result<Self, DecodingError> {
        let (element, consumed) = Self::decode(bytes)?;
        if consumed != bytes.len() {
            return Err(DecodingError::TrailingBytes {
                count: bytes.len() - consumed,
            });
        }
        Ok(element)
    }

    /// Decode the value of this element as a sequence of child elements.
    ///
    /// The children must fill the value exactly.
    pub fn children(&self) -> Result<Vec<Element>, DecodingError> {
        decode_sequence(&self.value)
    }

    /// Fail unless this element carries `expected` as its tag.
    pub fn expect_tag(&self, expected: u8) -> Result<&Self, DecodingError> {
        if self.tag != expected {
            return Err(DecodingError::UnexpectedTag {
                expected,
                actual: self.tag,
            });
        }
        Ok(self)
    }
}

/// Decode back-to-back sibling elements filling all of `bytes`.
pub fn decode_sequence(bytes: &[u8]) -> Result<Vec<Element>, DecodingError> {
    let mut elements = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (element, consumed) = Element::decode(&bytes[offset..])?;
        elements.push(element);
        offset += consumed;
    }
    Ok(elements)
}

/// Number of bytes needed to encode `length` (short or long form).
fn length_header_len(length: usize) -> usize {
    if length < LONG_FORM_BIT as usize {
        1
    } else {
        1 + significant_bytes(length)
    }
}

fn significant_bytes(length: usize) -> usize {
    let bits = usize::BITS - length.leading_zeros();
    bits.div_ceil(8) as usize
}

fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length < LONG_FORM_BIT as usize {
        out.push(length as u8);
        return;
    }
    let count = significant_bytes(length);
    out.push(LONG_FORM_BIT | count as u8);
    let be = length.to_be_bytes();
    out.extend_from_slice(&be[be.len() - count..]);
}

/// Decode a length from the bytes following the tag.
///
/// Returns the declared value length and how many bytes the length used.
fn decode_length(bytes: &[u8]) -> Result<(usize, usize), DecodingError> {
    let &first = bytes.first().ok_or(DecodingError::Truncated {
        declared: 1,
        available: 0,
    })?;

    if first & LONG_FORM_BIT == 0 {
        return Ok((first as usize, 1));
    }

    let count = first & !LONG_FORM_BIT;
    if count == 0 {
        return Err(DecodingError::IndefiniteLength);
    }
    if count > MAX_LENGTH_BYTES {
        return Err(DecodingError::LengthTooLong { count });
    }

    let count = count as usize;
    let length_bytes = bytes.get(1..1 + count).ok_or(DecodingError::Truncated {
        declared: count,
        available: bytes.len() - 1,
    })?;
    let length = length_bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((length, 1 + count))
}
