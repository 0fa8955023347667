//! Request and response controls.
//!
//! A [`Control`] is the generic envelope: an oid, a criticality flag and an
//! optional opaque value. Typed controls implement [`DecodeableControl`] and
//! are registered by oid in a [`ControlRegistry`] so a generic control read
//! off the wire can be upgraded lazily.

mod envelope;
mod password_policy;
mod registry;
mod valueless;

use std::any::Any;
use std::fmt;

use crate::error::DecodingError;

pub use envelope::{Control, TAG_CONTROLS, decode_controls, encode_controls};
pub use password_policy::{
    PasswordPolicyErrorType, PasswordPolicyResponseControl, PasswordPolicyWarning,
    PasswordPolicyWarningType,
};
pub use registry::{ControlRegistry, DecodeFn};
pub use valueless::{
    ExtendedSchemaInfoRequestControl, PasswordValidationDetailsRequestControl,
    RetainIdentityRequestControl, RetirePasswordRequestControl, SubentriesRequestControl,
};

/// A control type with a fixed oid that can be decoded from, and turned back
/// into, the generic envelope.
pub trait DecodeableControl: Sized {
    const OID: &'static str;
    /// Human-readable name used in logs and errors.
    const NAME: &'static str;

    /// Upgrade a generic control carrying [`Self::OID`].
    fn decode_control(control: &Control) -> Result<Self, DecodingError>;

    /// Encode back into the generic envelope.
    fn to_control(&self) -> Control;
}

/// A decoded control of any type, as returned by the registry.
pub trait DecodedControl: fmt::Debug + Send + Sync + Any {
    fn name(&self) -> &str;
    fn oid(&self) -> &str;
    fn is_critical(&self) -> bool;
    /// For downcasting to the concrete control type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn DecodedControl {
    /// Downcast to a concrete control type.
    pub fn downcast_ref<T: DecodedControl>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
