//! Oid-keyed registry of control decoders.
//!
//! # Thread Safety
//!
//! Decoders live in an `ArcSwap`ed map. Lookups load a snapshot without
//! locking; registration copies the map and swaps it in, so a decode that
//! raced a registration sees either the old or the new map, never a mix.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use log::debug;

use super::{
    Control, DecodeableControl, DecodedControl, ExtendedSchemaInfoRequestControl,
    PasswordPolicyResponseControl, PasswordValidationDetailsRequestControl,
    RetainIdentityRequestControl, RetirePasswordRequestControl, SubentriesRequestControl,
};
use crate::error::DecodingError;

/// Upgrades a generic control into a typed one.
pub type DecodeFn = fn(&Control) -> Result<Box<dyn DecodedControl>, DecodingError>;

pub struct ControlRegistry {
    decoders: ArcSwap<HashMap<String, DecodeFn>>,
}

impl std::fmt::Debug for ControlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let decoders = self.decoders.load();
        let mut oids: Vec<&String> = decoders.keys().collect();
        oids.sort();
        f.debug_struct("ControlRegistry")
            .field("oids", &oids)
            .finish()
    }
}

impl Default for ControlRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlRegistry {
    /// An empty registry: every control decodes as the generic envelope.
    pub fn new() -> Self {
        Self {
            decoders: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// A registry pre-populated with the controls this crate implements.
    pub fn with_builtin_controls() -> Self {
        let registry = Self::new();
        registry.register::<PasswordPolicyResponseControl>();
        registry.register::<RetainIdentityRequestControl>();
        registry.register::<SubentriesRequestControl>();
        registry.register::<ExtendedSchemaInfoRequestControl>();
        registry.register::<PasswordValidationDetailsRequestControl>();
        registry.register::<RetirePasswordRequestControl>();
        registry
    }

    /// The process-wide registry, created with the built-in controls on
    /// first use.
    pub fn global() -> &'static ControlRegistry {
        static GLOBAL: OnceLock<ControlRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_builtin_controls)
    }

    /// Register `decode` for `oid`, replacing any previous decoder.
    pub fn register_control_type(&self, oid: impl Into<String>, decode: DecodeFn) {
        let oid = oid.into();
        debug!(target: "dirwire::control", "Registering decoder for control {}", oid);
        self.decoders.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(oid.clone(), decode);
            next
        });
    }

    /// Register the decoder of a typed control under its oid.
    pub fn register<T>(&self)
    where
        T: DecodeableControl + DecodedControl,
    {
        self.register_control_type(T::OID, decode_boxed::<T>);
    }

    pub fn is_registered(&self, oid: &str) -> bool {
        self.decoders.load().contains_key(oid)
    }

    /// Build a control from its parts and upgrade it if its oid is known.
    pub fn decode(
        &self,
        oid: &str,
        is_critical: bool,
        value: Option<&[u8]>,
    ) -> Result<Box<dyn DecodedControl>, DecodingError> {
        let control = Control::try_new(oid, is_critical, value.map(<[u8]>::to_vec))?;
        self.decode_control(&control)
    }

    /// Upgrade `control` if its oid is known, otherwise return it unchanged.
    pub fn decode_control(
        &self,
        control: &Control,
    ) -> Result<Box<dyn DecodedControl>, DecodingError> {
        let decode = self.decoders.load().get(control.oid()).copied();
        match decode {
            Some(decode) => decode(control).inspect_err(|e| {
                debug!(
                    target: "dirwire::control",
                    "Failed to decode control {}: {}",
                    control.oid(),
                    e
                );
            }),
            None => Ok(Box::new(control.clone())),
        }
    }
}

fn decode_boxed<T>(control: &Control) -> Result<Box<dyn DecodedControl>, DecodingError>
where
    T: DecodeableControl + DecodedControl,
{
    Ok(Box::new(T::decode_control(control)?))
}
