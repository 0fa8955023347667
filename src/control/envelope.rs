//! The generic control envelope and the message-level controls list.

use std::any::Any;

use super::DecodedControl;
use crate::asn1::{
    Element, TAG_BOOLEAN, TAG_OCTET_STRING, TAG_SEQUENCE, decode_boolean, encode_boolean,
    encode_octet_string, encode_sequence,
};
use crate::error::DecodingError;

/// Context tag `[0]` wrapping the controls of one message.
pub const TAG_CONTROLS: u8 = 0xA0;

/// An oid, a criticality flag and an optional opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Control {
    oid: String,
    is_critical: bool,
    value: Option<Vec<u8>>,
}

impl Control {
    /// Create a control from a compile-time oid such as a type's `OID`.
    ///
    /// Oids built at runtime go through [`Control::try_new`].
    pub fn new(oid: &'static str, is_critical: bool, value: Option<Vec<u8>>) -> Self {
        debug_assert!(!oid.is_empty(), "control oid must not be empty");
        Self {
            oid: oid.to_owned(),
            is_critical,
            value,
        }
    }

    /// Create a control from an oid known only at runtime.
    ///
    /// # Errors
    /// Returns [`DecodingError`] when `oid` is empty.
    pub fn try_new(
        oid: impl Into<String>,
        is_critical: bool,
        value: Option<Vec<u8>>,
    ) -> Result<Self, DecodingError> {
        let oid = oid.into();
        if oid.is_empty() {
            return Err(DecodingError::control("control", "oid is empty"));
        }
        Ok(Self {
            oid,
            is_critical,
            value,
        })
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn is_critical(&self) -> bool {
        self.is_critical
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Encode as `SEQUENCE { oid, criticality, value }`.
    ///
    /// The criticality is written only when true and the value only when
    /// present.
    pub fn encode(&self) -> Element {
        let mut children = Vec::with_capacity(3);
        children.push(encode_octet_string(TAG_OCTET_STRING, self.oid.as_bytes()));
        if self.is_critical {
            children.push(encode_boolean(TAG_BOOLEAN, true));
        }
        if let Some(value) = &self.value {
            children.push(encode_octet_string(TAG_OCTET_STRING, value.as_slice()));
        }
        encode_sequence(&children)
    }

    /// Decode a generic control from its sequence element.
    pub fn decode(element: &Element) -> Result<Self, DecodingError> {
        let element = element
            .expect_tag(TAG_SEQUENCE)
            .map_err(|e| DecodingError::control("control", e.to_string()))?;
        let children = element.children()?;

        let mut children = children.into_iter();
        let oid_element = children
            .next()
            .ok_or_else(|| DecodingError::control("control", "sequence is empty"))?;
        oid_element.expect_tag(TAG_OCTET_STRING)?;
        let oid = String::from_utf8(oid_element.into_value())
            .map_err(|_| DecodingError::control("control", "oid is not valid UTF-8"))?;

        let mut is_critical = None;
        let mut value = None;
        for child in children {
            match child.tag() {
                TAG_BOOLEAN if is_critical.is_none() && value.is_none() => {
                    is_critical = Some(decode_boolean(&child)?);
                }
                TAG_OCTET_STRING if value.is_none() => value = Some(child.into_value()),
                other => {
                    return Err(DecodingError::control(
                        oid,
                        format!("unexpected element with tag {other:#04x}"),
                    ));
                }
            }
        }

        Self::try_new(oid, is_critical.unwrap_or(false), value)
    }
}

impl DecodedControl for Control {
    fn name(&self) -> &str {
        "Generic Control"
    }

    fn oid(&self) -> &str {
        &self.oid
    }

    fn is_critical(&self) -> bool {
        self.is_critical
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wrap `controls` in the message-level `[0]` element.
pub fn encode_controls(controls: &[Control]) -> Element {
    let children: Vec<Element> = controls.iter().map(Control::encode).collect();
    Element::constructed(TAG_CONTROLS, &children)
}

/// Decode the message-level `[0]` controls element.
pub fn decode_controls(element: &Element) -> Result<Vec<Control>, DecodingError> {
    element.expect_tag(TAG_CONTROLS)?;
    element.children()?.iter().map(Control::decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_critical_control_without_value_is_oid_only() {
        let control = Control::new("1.2.3", false, None);
        assert_eq!(
            control.encode().encode(),
            vec![0x30, 0x07, 0x04, 0x05, b'1', b'.', b'2', b'.', b'3']
        );
    }

    #[test]
    fn critical_control_with_value_round_trips() {
        let control = Control::new("1.2.3", true, Some(vec![0x01, 0x02]));
        let bytes = control.encode().encode();
        assert_eq!(&bytes[9..12], &[0x01, 0x01, 0xFF]);

        let decoded = Control::decode(&Element::decode_exact(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, control);
    }

    #[test]
    fn explicit_false_criticality_is_accepted() {
        let element = encode_sequence(&[
            encode_octet_string(TAG_OCTET_STRING, "1.2.3"),
            encode_boolean(TAG_BOOLEAN, false),
        ]);
        let decoded = Control::decode(&element).unwrap();
        assert!(!decoded.is_critical());
        assert!(!decoded.has_value());
    }

    #[test]
    fn empty_value_is_distinct_from_absent_value() {
        let control = Control::new("1.2.3", false, Some(Vec::new()));
        let decoded = Control::decode(&control.encode()).unwrap();
        assert_eq!(decoded.value(), Some(&[][..]));
    }

    #[test]
    fn empty_oid_is_rejected() {
        let element = encode_sequence(&[encode_octet_string(TAG_OCTET_STRING, "")]);
        assert!(Control::decode(&element).is_err());
        assert!(Control::try_new("", false, None).is_err());
    }

    #[test]
    fn runtime_oid_goes_through_try_new() {
        let oid = format!("1.3.6.1.4.1.{}", 42);
        let control = Control::try_new(oid.clone(), true, None).unwrap();
        assert_eq!(control.oid(), oid);
        assert_eq!(control, Control::new("1.3.6.1.4.1.42", true, None));
    }

    #[test]
    fn element_after_value_is_rejected() {
        let element = encode_sequence(&[
            encode_octet_string(TAG_OCTET_STRING, "1.2.3"),
            encode_octet_string(TAG_OCTET_STRING, "v"),
            encode_boolean(TAG_BOOLEAN, true),
        ]);
        let err = Control::decode(&element).unwrap_err();
        assert!(matches!(err, DecodingError::Control { .. }), "{err}");
    }

    #[test]
    fn non_sequence_is_rejected() {
        let element = encode_octet_string(TAG_OCTET_STRING, "1.2.3");
        assert!(Control::decode(&element).is_err());
    }

    #[test]
    fn controls_list_round_trips() {
        let controls = vec![
            Control::new("1.2.3", true, None),
            Control::new("4.5.6", false, Some(b"abc".to_vec())),
        ];
        let element = encode_controls(&controls);
        assert_eq!(element.tag(), TAG_CONTROLS);
        assert_eq!(decode_controls(&element).unwrap(), controls);
    }

    #[test]
    fn empty_controls_list_decodes_to_nothing() {
        let element = encode_controls(&[]);
        assert_eq!(element.encode(), vec![0xA0, 0x00]);
        assert!(decode_controls(&element).unwrap().is_empty());
    }
}
