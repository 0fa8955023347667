//! Password policy response control.
//!
//! ```text
//! PasswordPolicyResponseValue ::= SEQUENCE {
//!     warning   [0] CHOICE {
//!         timeBeforeExpiration [0] INTEGER (0 .. maxInt),
//!         graceAuthNsRemaining [1] INTEGER (0 .. maxInt) } OPTIONAL,
//!     error     [1] ENUMERATED { ... } OPTIONAL }
//! ```

use std::any::Any;
use std::fmt;

use super::{Control, DecodeableControl, DecodedControl};
use crate::asn1::{
    Element, TAG_SEQUENCE, decode_enumerated, decode_i32, encode_enumerated, encode_integer,
    encode_sequence,
};
use crate::error::DecodingError;

const TAG_WARNING: u8 = 0xA0;
const TAG_ERROR: u8 = 0x81;
const TAG_TIME_BEFORE_EXPIRATION: u8 = 0x80;
const TAG_GRACE_LOGINS_REMAINING: u8 = 0x81;

/// Which warning the server attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordPolicyWarningType {
    /// Seconds until the password expires.
    TimeBeforeExpiration,
    /// Grace logins left after expiration.
    GraceLoginsRemaining,
}

impl PasswordPolicyWarningType {
    fn tag(self) -> u8 {
        match self {
            Self::TimeBeforeExpiration => TAG_TIME_BEFORE_EXPIRATION,
            Self::GraceLoginsRemaining => TAG_GRACE_LOGINS_REMAINING,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_TIME_BEFORE_EXPIRATION => Some(Self::TimeBeforeExpiration),
            TAG_GRACE_LOGINS_REMAINING => Some(Self::GraceLoginsRemaining),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TimeBeforeExpiration => "time before expiration",
            Self::GraceLoginsRemaining => "grace logins remaining",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PasswordPolicyWarning {
    pub kind: PasswordPolicyWarningType,
    pub value: i32,
}

impl PasswordPolicyWarning {
    pub fn time_before_expiration(seconds: i32) -> Self {
        Self {
            kind: PasswordPolicyWarningType::TimeBeforeExpiration,
            value: seconds,
        }
    }

    pub fn grace_logins_remaining(count: i32) -> Self {
        Self {
            kind: PasswordPolicyWarningType::GraceLoginsRemaining,
            value: count,
        }
    }
}

/// Why the server rejected or restricted the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordPolicyErrorType {
    PasswordExpired,
    AccountLocked,
    ChangeAfterReset,
    PasswordModNotAllowed,
    MustSupplyOldPassword,
    InsufficientPasswordQuality,
    PasswordTooShort,
    PasswordTooYoung,
    PasswordInHistory,
}

impl PasswordPolicyErrorType {
    pub const ALL: [PasswordPolicyErrorType; 9] = [
        Self::PasswordExpired,
        Self::AccountLocked,
        Self::ChangeAfterReset,
        Self::PasswordModNotAllowed,
        Self::MustSupplyOldPassword,
        Self::InsufficientPasswordQuality,
        Self::PasswordTooShort,
        Self::PasswordTooYoung,
        Self::PasswordInHistory,
    ];

    pub fn value(self) -> i32 {
        match self {
            Self::PasswordExpired => 0,
            Self::AccountLocked => 1,
            Self::ChangeAfterReset => 2,
            Self::PasswordModNotAllowed => 3,
            Self::MustSupplyOldPassword => 4,
            Self::InsufficientPasswordQuality => 5,
            Self::PasswordTooShort => 6,
            Self::PasswordTooYoung => 7,
            Self::PasswordInHistory => 8,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|error| error.value() == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PasswordExpired => "password expired",
            Self::AccountLocked => "account locked",
            Self::ChangeAfterReset => "change after reset",
            Self::PasswordModNotAllowed => "password mod not allowed",
            Self::MustSupplyOldPassword => "must supply old password",
            Self::InsufficientPasswordQuality => "insufficient password quality",
            Self::PasswordTooShort => "password too short",
            Self::PasswordTooYoung => "password too young",
            Self::PasswordInHistory => "password in history",
        }
    }
}

/// Response control describing the password policy state of the bound
/// account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicyResponseControl {
    warning: Option<PasswordPolicyWarning>,
    error: Option<PasswordPolicyErrorType>,
    is_critical: bool,
}

impl PasswordPolicyResponseControl {
    pub fn new(
        warning: Option<PasswordPolicyWarning>,
        error: Option<PasswordPolicyErrorType>,
        is_critical: bool,
    ) -> Self {
        Self {
            warning,
            error,
            is_critical,
        }
    }

    pub fn warning(&self) -> Option<PasswordPolicyWarning> {
        self.warning
    }

    pub fn error(&self) -> Option<PasswordPolicyErrorType> {
        self.error
    }

    pub fn is_critical(&self) -> bool {
        self.is_critical
    }

    /// Find and decode the password policy control in a response's controls.
    ///
    /// Returns `Ok(None)` when no control carries the oid.
    pub fn get(controls: &[Control]) -> Result<Option<Self>, DecodingError> {
        controls
            .iter()
            .find(|control| control.oid() == Self::OID)
            .map(Self::decode_control)
            .transpose()
    }

    fn encode_value(&self) -> Vec<u8> {
        let mut elements = Vec::with_capacity(2);
        if let Some(warning) = self.warning {
            let inner = encode_integer(warning.kind.tag(), i64::from(warning.value));
            elements.push(Element::constructed(TAG_WARNING, &[inner]));
        }
        if let Some(error) = self.error {
            elements.push(encode_enumerated(TAG_ERROR, error.value()));
        }
        encode_sequence(&elements).encode()
    }
}

fn malformed(reason: impl Into<String>) -> DecodingError {
    DecodingError::control(PasswordPolicyResponseControl::NAME, reason)
}

fn decode_warning(element: &Element) -> Result<PasswordPolicyWarning, DecodingError> {
    let inner = match element.children()?.as_slice() {
        [inner] => inner.clone(),
        other => {
            return Err(malformed(format!(
                "warning must hold exactly one element, found {}",
                other.len()
            )));
        }
    };
    let kind = PasswordPolicyWarningType::from_tag(inner.tag())
        .ok_or_else(|| malformed(format!("unknown warning tag {:#04x}", inner.tag())))?;
    let value = decode_i32(&inner).map_err(|e| malformed(format!("cannot decode warning: {e}")))?;
    Ok(PasswordPolicyWarning { kind, value })
}

fn decode_error(element: &Element) -> Result<PasswordPolicyErrorType, DecodingError> {
    let value =
        decode_enumerated(element).map_err(|e| malformed(format!("cannot decode error: {e}")))?;
    PasswordPolicyErrorType::from_value(value)
        .ok_or_else(|| malformed(format!("unknown error value {value}")))
}

impl DecodeableControl for PasswordPolicyResponseControl {
    const OID: &'static str = "1.3.6.1.4.1.42.2.27.8.5.1";
    const NAME: &'static str = "Password Policy Response Control";

    fn decode_control(control: &Control) -> Result<Self, DecodingError> {
        let value = control
            .value()
            .ok_or_else(|| malformed("control has no value"))?;
        let sequence = Element::decode_exact(value)
            .and_then(|element| {
                element.expect_tag(TAG_SEQUENCE)?;
                element.children()
            })
            .map_err(|e| malformed(format!("value is not a sequence: {e}")))?;
        if sequence.len() > 2 {
            return Err(malformed(format!(
                "value sequence has {} elements, at most 2 are allowed",
                sequence.len()
            )));
        }

        let mut warning = None;
        let mut error = None;
        for element in &sequence {
            match element.tag() {
                TAG_WARNING => {
                    if warning.is_some() {
                        return Err(malformed("multiple warning elements"));
                    }
                    warning = Some(decode_warning(element)?);
                }
                TAG_ERROR => {
                    if error.is_some() {
                        return Err(malformed("multiple error elements"));
                    }
                    error = Some(decode_error(element)?);
                }
                other => {
                    return Err(malformed(format!("unknown element tag {other:#04x}")));
                }
            }
        }

        Ok(Self::new(warning, error, control.is_critical()))
    }

    fn to_control(&self) -> Control {
        Control::new(Self::OID, self.is_critical, Some(self.encode_value()))
    }
}

impl DecodedControl for PasswordPolicyResponseControl {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn oid(&self) -> &str {
        Self::OID
    }

    fn is_critical(&self) -> bool {
        self.is_critical
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for PasswordPolicyResponseControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordPolicyResponseControl(")?;
        if let Some(warning) = self.warning {
            write!(
                f,
                "warningType='{}', warningValue={}, ",
                warning.kind.name(),
                warning.value
            )?;
        }
        if let Some(error) = self.error {
            write!(f, "errorType='{}', ", error.name())?;
        }
        write!(f, "isCritical={})", self.is_critical)
    }
}
