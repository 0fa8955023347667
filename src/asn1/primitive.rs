//! Primitive value encodings: integers, enumerations, booleans, strings, null.
//!
//! Every encoder takes the tag explicitly so context-specific tags (`0x80`,
//! `0x81`, ...) share the same code as the universal ones.

use super::Element;
use crate::error::DecodingError;

pub const TAG_BOOLEAN: u8 = 0x01;
pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_ENUMERATED: u8 = 0x0A;
pub const TAG_SEQUENCE: u8 = 0x30;

/// Encode `value` as a big-endian, minimal-length two's-complement integer.
pub fn encode_integer(tag: u8, value: i64) -> Element {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ones = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;
        if !(redundant_zero || redundant_ones) {
            break;
        }
        start += 1;
    }
    Element::new(tag, bytes[start..].to_vec())
}

pub fn encode_enumerated(tag: u8, value: i32) -> Element {
    encode_integer(tag, i64::from(value))
}

/// Encode a boolean; true is written as `0xFF`.
pub fn encode_boolean(tag: u8, value: bool) -> Element {
    Element::new(tag, vec![if value { 0xFF } else { 0x00 }])
}

pub fn encode_octet_string(tag: u8, value: impl Into<Vec<u8>>) -> Element {
    Element::new(tag, value)
}

pub fn encode_null(tag: u8) -> Element {
    Element::new(tag, Vec::new())
}

pub fn encode_sequence(children: &[Element]) -> Element {
    Element::constructed(TAG_SEQUENCE, children)
}

/// Decode an integer payload of 1 to 8 bytes.
pub fn decode_i64(element: &Element) -> Result<i64, DecodingError> {
    decode_signed(element.value(), 8, "integer")
}

/// Decode an integer payload that must fit in 1 to 4 bytes.
pub fn decode_i32(element: &Element) -> Result<i32, DecodingError> {
    decode_signed(element.value(), 4, "integer").map(|v| v as i32)
}

/// Decode an enumerated payload; enumerations are short integers.
pub fn decode_enumerated(element: &Element) -> Result<i32, DecodingError> {
    decode_signed(element.value(), 4, "enumerated").map(|v| v as i32)
}

/// Decode a single-byte boolean payload; any non-zero byte is true.
pub fn decode_boolean(element: &Element) -> Result<bool, DecodingError> {
    match element.value() {
        [byte] => Ok(*byte != 0),
        other => Err(DecodingError::invalid_value(
            "boolean",
            format!("expected 1 byte, found {}", other.len()),
        )),
    }
}

fn decode_signed(bytes: &[u8], max_len: usize, kind: &'static str) -> Result<i64, DecodingError> {
    if bytes.is_empty() || bytes.len() > max_len {
        return Err(DecodingError::invalid_value(
            kind,
            format!(
                "payload must be 1 to {} bytes, found {}",
                max_len,
                bytes.len()
            ),
        ));
    }
    let initial: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(bytes
        .iter()
        .fold(initial, |acc, &b| (acc << 8) | i64::from(b)))
}
