//! Tag-length-value codec for the protocol's BER subset.
//!
//! Only what controls and message envelopes need: single-byte tags, definite
//! lengths of at most four length bytes, and a handful of primitive types.

pub mod element;
pub mod primitive;

pub use element::{Element, decode_sequence};
pub use primitive::{
    TAG_BOOLEAN, TAG_ENUMERATED, TAG_INTEGER, TAG_NULL, TAG_OCTET_STRING, TAG_SEQUENCE,
    decode_boolean, decode_enumerated, decode_i32, decode_i64, encode_boolean, encode_enumerated,
    encode_integer, encode_null, encode_octet_string, encode_sequence,
};
