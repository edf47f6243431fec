//! Move identifiers and module ids.

use core::{fmt, str::FromStr};

use super::{AccountAddress, AddressParseError};
use crate::bcs::{self, Decode, DecodeError, Encode};

/// Identifier or module id text that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Empty, or a character outside `[A-Za-z0-9_]`.
    #[error("invalid move identifier: '{0}'")]
    Invalid(String),
    /// Module ids are written `address::name`.
    #[error("module id must be 'address::name': '{0}'")]
    MalformedModuleId(String),
    /// The address half of a module id.
    #[error(transparent)]
    Address(#[from] AddressParseError),
}

/// `[A-Za-z0-9_]+`.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// A module, function or struct name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a name.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let text = name.into();
        if is_valid_identifier(&text) {
            Ok(Self(text))
        } else {
            Err(IdentifierError::Invalid(text))
        }
    }

    /// A name known to be valid at compile time.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(is_valid_identifier(name), "invalid static identifier");
        Self(name.to_owned())
    }

    /// The name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::new(name)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl Encode for Identifier {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_str(&self.0);
    }
}

impl Decode for Identifier {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let name = deserializer.deserialize_str()?;
        Self::new(name).map_err(|err| DecodeError::invalid("Identifier", err))
    }
}

/// A published module: `address::name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    /// Publishing account.
    pub address: AccountAddress,
    /// Module name.
    pub name: Identifier,
}

impl ModuleId {
    /// A module id from its parts.
    #[must_use]
    pub const fn new(address: AccountAddress, name: Identifier) -> Self {
        Self { address, name }
    }
}

impl FromStr for ModuleId {
    type Err = IdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split("::");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(address), Some(name), None) => Ok(Self {
                address: AccountAddress::from_str_relaxed(address)?,
                name: Identifier::new(name)?,
            }),
            _ => Err(IdentifierError::MalformedModuleId(input.to_owned())),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}::{}", self.address, self.name)
    }
}

impl Encode for ModuleId {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.address.encode(serializer);
        self.name.encode(serializer);
    }
}

impl Decode for ModuleId {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            address: deserializer.deserialize()?,
            name: deserializer.deserialize()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_text() {
        let id: ModuleId = "0x1::aptos_account".parse().unwrap();
        assert_eq!(id.address, AccountAddress::ONE);
        assert_eq!(id.name.as_str(), "aptos_account");
        assert_eq!(id.to_string(), "0x1::aptos_account");
    }

    #[test]
    fn malformed_module_ids() {
        assert_eq!(
            "0x1".parse::<ModuleId>(),
            Err(IdentifierError::MalformedModuleId("0x1".to_owned()))
        );
        assert_eq!(
            "0x1::coin::transfer".parse::<ModuleId>(),
            Err(IdentifierError::MalformedModuleId("0x1::coin::transfer".to_owned()))
        );
        assert_eq!(
            "0x1::co-in".parse::<ModuleId>(),
            Err(IdentifierError::Invalid("co-in".to_owned()))
        );
    }

    /// Decoding re-validates names; the wire cannot smuggle in `a b`.
    #[test]
    fn decode_validates() {
        let bytes = bcs::to_bytes("a b");
        assert!(matches!(
            bcs::from_bytes::<Identifier>(&bytes),
            Err(DecodeError::InvalidValue { .. })
        ));
    }
}
