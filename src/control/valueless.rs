//! Request controls whose presence is the whole message.
//!
//! Each one carries no value and fails to decode if the server or caller
//! attached one.

use std::any::Any;

use super::{Control, DecodeableControl, DecodedControl};
use crate::error::DecodingError;

macro_rules! valueless_control {
    (
        $(#[$meta:meta])*
        $name:ident {
            oid: $oid:literal,
            name: $display:literal,
            critical_by_default: $critical:literal $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            is_critical: bool,
        }

        impl $name {
            pub fn new(is_critical: bool) -> Self {
                Self { is_critical }
            }

            pub fn is_critical(&self) -> bool {
                self.is_critical
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new($critical)
            }
        }

        impl DecodeableControl for $name {
            const OID: &'static str = $oid;
            const NAME: &'static str = $display;

            fn decode_control(control: &Control) -> Result<Self, DecodingError> {
                if control.has_value() {
                    return Err(DecodingError::control(
                        Self::NAME,
                        "control must not have a value",
                    ));
                }
                Ok(Self::new(control.is_critical()))
            }

            fn to_control(&self) -> Control {
                Control::new(Self::OID, self.is_critical, None)
            }
        }

        impl DecodedControl for $name {
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
    };
}

valueless_control! {
    /// Process the operation without changing the connection's authorization
    /// identity, even for a successful bind.
    RetainIdentityRequestControl {
        oid: "1.3.6.1.4.1.30221.2.5.3",
        name: "Retain Identity Request Control",
        critical_by_default: true,
    }
}

valueless_control! {
    /// Make a search return subentries instead of regular entries.
    SubentriesRequestControl {
        oid: "1.3.6.1.4.1.7628.5.101.1",
        name: "Subentries Request Control",
        critical_by_default: false,
    }
}

valueless_control! {
    /// Ask for extended schema information in schema searches.
    ExtendedSchemaInfoRequestControl {
        oid: "1.3.6.1.4.1.30221.2.5.12",
        name: "Extended Schema Info Request Control",
        critical_by_default: false,
    }
}

valueless_control! {
    /// Ask the server to explain which password validators a new password
    /// passed or failed.
    PasswordValidationDetailsRequestControl {
        oid: "1.3.6.1.4.1.30221.2.5.40",
        name: "Password Validation Details Request Control",
        critical_by_default: false,
    }
}

valueless_control! {
    /// Keep the current password usable for a while after a password change.
    RetirePasswordRequestControl {
        oid: "1.3.6.1.4.1.30221.2.5.31",
        name: "Retire Password Request Control",
        critical_by_default: true,
    }
}
