//! ## Move type tags
//!
//! A [`TypeTag`] names a Move type: a primitive, `vector<T>`, a struct
//! `address::module::Name<T, ...>`, and, in ABIs only, a reference `&T` or
//! a generic placeholder `T0`, `T1`, ...
//!
//! Wire tags:
//!
//! | tag | type      | tag | type    |
//! |-----|-----------|-----|---------|
//! | 0   | bool      | 7   | struct  |
//! | 1   | u8        | 8   | u16     |
//! | 2   | u64       | 9   | u32     |
//! | 3   | u128      | 10  | u256    |
//! | 4   | address   | 254 | `&T`    |
//! | 5   | signer    | 255 | generic |
//! | 6   | vector    |     |         |
//!
//! Text is parsed by [`parse_type_tag`].

mod parser;

use core::{fmt, str::FromStr};

pub use parser::{TypeTagParseError, TypeTagParseErrorKind, parse_type_tag};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    primitives::{AccountAddress, Identifier},
};

/// A Move type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `bool`
    Bool,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `u256`
    U256,
    /// `address`
    Address,
    /// `signer`
    Signer,
    /// `vector<T>`
    Vector(Box<TypeTag>),
    /// `address::module::Name<T, ...>`
    Struct(Box<StructTag>),
    /// `&T`; ABI only.
    Reference(Box<TypeTag>),
    /// `T<n>`; ABI only.
    Generic(u32),
}

impl TypeTag {
    /// `vector<inner>`.
    #[must_use]
    pub fn vector(inner: Self) -> Self {
        Self::Vector(Box::new(inner))
    }

    /// Whether this tag, or any tag nested in it, is a reference or a
    /// generic placeholder. Such tags cannot appear as transaction type
    /// arguments.
    #[must_use]
    pub fn is_abi_only(&self) -> bool {
        match self {
            Self::Reference(_) | Self::Generic(_) => true,
            Self::Vector(inner) => inner.is_abi_only(),
            Self::Struct(tag) => tag.type_args.iter().any(Self::is_abi_only),
            Self::Bool
            | Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::U128
            | Self::U256
            | Self::Address
            | Self::Signer => false,
        }
    }

    /// The struct tag, if this is a struct.
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructTag> {
        if let Self::Struct(tag) = self {
            Some(tag)
        } else {
            None
        }
    }

    /// Substitute generic placeholders with concrete type arguments.
    ///
    /// Placeholders without a matching argument are left in place.
    #[must_use]
    pub fn instantiate(&self, type_args: &[Self]) -> Self {
        match self {
            Self::Generic(index) => usize::try_from(*index)
                .ok()
                .and_then(|position| type_args.get(position))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Self::Vector(inner) => Self::vector(inner.instantiate(type_args)),
            Self::Reference(inner) => Self::Reference(Box::new(inner.instantiate(type_args))),
            Self::Struct(tag) => Self::Struct(Box::new(StructTag {
                type_args: tag
                    .type_args
                    .iter()
                    .map(|arg| arg.instantiate(type_args))
                    .collect(),
                ..(**tag).clone()
            })),
            Self::Bool
            | Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::U128
            | Self::U256
            | Self::Address
            | Self::Signer => self.clone(),
        }
    }
}

impl From<StructTag> for TypeTag {
    fn from(tag: StructTag) -> Self {
        Self::Struct(Box::new(tag))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => formatter.write_str("bool"),
            Self::U8 => formatter.write_str("u8"),
            Self::U16 => formatter.write_str("u16"),
            Self::U32 => formatter.write_str("u32"),
            Self::U64 => formatter.write_str("u64"),
            Self::U128 => formatter.write_str("u128"),
            Self::U256 => formatter.write_str("u256"),
            Self::Address => formatter.write_str("address"),
            Self::Signer => formatter.write_str("signer"),
            Self::Vector(inner) => write!(formatter, "vector<{inner}>"),
            Self::Struct(tag) => write!(formatter, "{tag}"),
            Self::Reference(inner) => write!(formatter, "&{inner}"),
            Self::Generic(index) => write!(formatter, "T{index}"),
        }
    }
}

impl FromStr for TypeTag {
    type Err = TypeTagParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_type_tag(input, false)
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_type_tag(&text, true).map_err(D::Error::custom)
    }
}

impl Encode for TypeTag {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Bool => serializer.serialize_variant(0),
            Self::U8 => serializer.serialize_variant(1),
            Self::U64 => serializer.serialize_variant(2),
            Self::U128 => serializer.serialize_variant(3),
            Self::Address => serializer.serialize_variant(4),
            Self::Signer => serializer.serialize_variant(5),
            Self::Vector(inner) => {
                serializer.serialize_variant(6);
                inner.encode(serializer);
            }
            Self::Struct(tag) => {
                serializer.serialize_variant(7);
                tag.encode(serializer);
            }
            Self::U16 => serializer.serialize_variant(8),
            Self::U32 => serializer.serialize_variant(9),
            Self::U256 => serializer.serialize_variant(10),
            Self::Reference(inner) => {
                serializer.serialize_variant(254);
                inner.encode(serializer);
            }
            Self::Generic(index) => {
                serializer.serialize_variant(255);
                serializer.serialize_u32(*index);
            }
        }
    }
}

impl Decode for TypeTag {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(match deserializer.deserialize_variant()? {
            0 => Self::Bool,
            1 => Self::U8,
            2 => Self::U64,
            3 => Self::U128,
            4 => Self::Address,
            5 => Self::Signer,
            6 => Self::Vector(deserializer.deserialize()?),
            7 => Self::Struct(deserializer.deserialize()?),
            8 => Self::U16,
            9 => Self::U32,
            10 => Self::U256,
            254 => Self::Reference(deserializer.deserialize()?),
            255 => Self::Generic(deserializer.deserialize_u32()?),
            tag => {
                return Err(DecodeError::UnknownVariant {
                    type_name: "TypeTag",
                    tag,
                });
            }
        })
    }
}

/// A struct type: `address::module::Name<type_args>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructTag {
    /// Publishing account.
    pub address: AccountAddress,
    /// Module name.
    pub module: Identifier,
    /// Struct name.
    pub name: Identifier,
    /// Type arguments.
    pub type_args: Vec<TypeTag>,
}

impl StructTag {
    fn framework(module: &'static str, name: &'static str, type_args: Vec<TypeTag>) -> Self {
        Self {
            address: AccountAddress::ONE,
            module: Identifier::from_static(module),
            name: Identifier::from_static(name),
            type_args,
        }
    }

    /// `0x1::aptos_coin::AptosCoin`
    #[must_use]
    pub fn aptos_coin() -> Self {
        Self::framework("aptos_coin", "AptosCoin", Vec::new())
    }

    /// `0x1::string::String`
    #[must_use]
    pub fn string() -> Self {
        Self::framework("string", "String", Vec::new())
    }

    /// `0x1::option::Option<inner>`
    #[must_use]
    pub fn option(inner: TypeTag) -> Self {
        Self::framework("option", "Option", vec![inner])
    }

    /// `0x1::object::Object<inner>`
    #[must_use]
    pub fn object(inner: TypeTag) -> Self {
        Self::framework("object", "Object", vec![inner])
    }

    fn is_framework(&self, module: &str, name: &str) -> bool {
        self.address == AccountAddress::ONE
            && self.module.as_str() == module
            && self.name.as_str() == name
    }

    /// `0x1::string::String`?
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.is_framework("string", "String")
    }

    /// `0x1::option::Option<_>`?
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.is_framework("option", "Option")
    }

    /// `0x1::object::Object<_>`?
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.is_framework("object", "Object")
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}::{}::{}", self.address, self.module, self.name)?;
        if let Some((first, rest)) = self.type_args.split_first() {
            write!(formatter, "<{first}")?;
            for arg in rest {
                write!(formatter, ", {arg}")?;
            }
            formatter.write_str(">")?;
        }
        Ok(())
    }
}

impl Encode for StructTag {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.address.encode(serializer);
        self.module.encode(serializer);
        self.name.encode(serializer);
        serializer.serialize_vec(&self.type_args);
    }
}

impl Decode for StructTag {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            address: deserializer.deserialize()?,
            module: deserializer.deserialize()?,
            name: deserializer.deserialize()?,
            type_args: deserializer.deserialize()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `0x1::string::String` is tag 7, the address, two names and no args.
    #[test]
    fn string_struct_encoding() {
        let tag = TypeTag::from(StructTag::string());
        let mut expected = vec![7u8];
        expected.extend_from_slice(AccountAddress::ONE.as_bytes());
        expected.push(6);
        expected.extend_from_slice(b"string");
        expected.push(6);
        expected.extend_from_slice(b"String");
        expected.push(0);
        assert_eq!(bcs::to_bytes(&tag), expected);
        assert_eq!(bcs::from_bytes::<TypeTag>(&expected).unwrap(), tag);
    }

    #[test]
    fn primitive_tags() {
        assert_eq!(bcs::to_bytes(&TypeTag::U16), [8]);
        assert_eq!(bcs::to_bytes(&TypeTag::U256), [10]);
        assert_eq!(bcs::to_bytes(&TypeTag::vector(TypeTag::U8)), [6, 1]);
        assert_eq!(
            bcs::from_bytes::<TypeTag>(&[11]),
            Err(DecodeError::UnknownVariant {
                type_name: "TypeTag",
                tag: 11,
            })
        );
    }

    #[test]
    fn display_nested() {
        let tag = TypeTag::from(StructTag {
            address: AccountAddress::ONE,
            module: Identifier::new("coin").unwrap(),
            name: Identifier::new("CoinStore").unwrap(),
            type_args: vec![
                StructTag::aptos_coin().into(),
                TypeTag::vector(TypeTag::Generic(0)),
            ],
        });
        assert_eq!(
            tag.to_string(),
            "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin, vector<T0>>"
        );
        assert!(tag.is_abi_only());
        let concrete = tag.instantiate(&[TypeTag::U64]);
        assert!(!concrete.is_abi_only());
        assert_eq!(
            concrete.to_string(),
            "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin, vector<u64>>"
        );
    }
}
