//! Entry function ABIs and argument conversion.
//!
//! An [`EntryFunctionAbi`] lists a function's parameter types. Given the
//! ABI, loosely typed JSON arguments (as a wallet or a CLI would supply
//! them) are converted into the BCS bytes an [`EntryFunction`] carries.
//!
//! | parameter type            | accepted JSON                              |
//! |---------------------------|--------------------------------------------|
//! | `bool`                    | `true`, `"true"`                           |
//! | `u8` ... `u128`           | number, decimal string                     |
//! | `u256`                    | number, decimal or `0x` hex string         |
//! | `address`, `Object<T>`    | address string                             |
//! | `0x1::string::String`     | string                                     |
//! | `vector<u8>`              | `0x` hex string, array                     |
//! | `vector<T>`               | array                                      |
//! | `0x1::option::Option<T>`  | `null` for none, otherwise the inner value |
//!
//! Leading `signer` and `&signer` parameters are supplied by the
//! transaction's signers and take no argument.
//!
//! [`EntryFunction`]: crate::transaction::EntryFunction

use serde_json::Value;

use crate::{
    bcs::{self, Encode as _},
    primitives::{AccountAddress, AddressParseError, HexError, U256, decode_hex},
    type_tag::{TypeTag, TypeTagParseError, parse_type_tag},
};

/// JSON arguments that do not fit the ABI.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// Wrong number of value arguments.
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Non-signer parameters.
        expected: usize,
        /// Arguments given.
        actual: usize,
    },

    /// Wrong number of type arguments.
    #[error("expected {expected} type arguments, got {actual}")]
    TypeArgumentCount {
        /// Generic parameters.
        expected: usize,
        /// Type arguments given.
        actual: usize,
    },

    /// JSON of the wrong shape for the parameter.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        /// The parameter type.
        expected: String,
        /// The JSON kind supplied.
        found: &'static str,
    },

    /// Not an integer of the parameter's width.
    #[error("'{value}' is not a valid {ty}")]
    InvalidInteger {
        /// The parameter type.
        ty: String,
        /// The offending value.
        value: String,
    },

    /// A parameter type that cannot be supplied from JSON.
    #[error("unsupported parameter type {0}")]
    UnsupportedType(String),

    /// An address argument did not parse.
    #[error(transparent)]
    Address(#[from] AddressParseError),

    /// A byte-vector argument was not hex.
    #[error(transparent)]
    Hex(#[from] HexError),
}

/// The parameter types of an entry function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryFunctionAbi {
    signers: usize,
    type_parameters: usize,
    parameters: Vec<TypeTag>,
}

fn is_signer(ty: &TypeTag) -> bool {
    matches!(ty, TypeTag::Reference(inner) if **inner == TypeTag::Signer)
        || *ty == TypeTag::Signer
}

impl EntryFunctionAbi {
    /// An ABI from its generic parameter count and parameter types.
    /// Leading signer parameters are split off.
    #[must_use]
    pub fn new(type_parameters: usize, mut parameters: Vec<TypeTag>) -> Self {
        let signers = parameters.iter().take_while(|ty| is_signer(ty)).count();
        Self {
            signers,
            type_parameters,
            parameters: parameters.split_off(signers),
        }
    }

    /// Parse parameter types as a node reports them, e.g. `&signer`,
    /// `vector<T0>`.
    pub fn parse(type_parameters: usize, parameters: &[&str]) -> Result<Self, TypeTagParseError> {
        let parsed = parameters
            .iter()
            .map(|text| parse_type_tag(text, true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(type_parameters, parsed))
    }

    /// Number of leading signer parameters.
    #[must_use]
    pub const fn signers(&self) -> usize {
        self.signers
    }

    /// Number of generic type parameters.
    #[must_use]
    pub const fn type_parameters(&self) -> usize {
        self.type_parameters
    }

    /// Parameters that take an argument.
    #[must_use]
    pub fn parameters(&self) -> &[TypeTag] {
        &self.parameters
    }

    /// Convert JSON arguments to BCS, instantiating generic parameters
    /// with `type_args`.
    pub fn encode_arguments(
        &self,
        type_args: &[TypeTag],
        args: &[Value],
    ) -> Result<Vec<Vec<u8>>, ArgumentError> {
        if type_args.len() != self.type_parameters {
            return Err(ArgumentError::TypeArgumentCount {
                expected: self.type_parameters,
                actual: type_args.len(),
            });
        }
        if args.len() != self.parameters.len() {
            return Err(ArgumentError::ArgumentCount {
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }
        self.parameters
            .iter()
            .zip(args)
            .map(|(ty, value)| encode_argument(value, &ty.instantiate(type_args)))
            .collect()
    }
}

/// BCS bytes of one JSON argument of a concrete type.
pub fn encode_argument(value: &Value, ty: &TypeTag) -> Result<Vec<u8>, ArgumentError> {
    let mut serializer = bcs::Serializer::new();
    encode_value(&mut serializer, value, ty)?;
    Ok(serializer.into_bytes())
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(ty: &TypeTag, value: &Value) -> ArgumentError {
    ArgumentError::TypeMismatch {
        expected: ty.to_string(),
        found: kind(value),
    }
}

fn invalid_integer(ty: &TypeTag, value: &Value) -> ArgumentError {
    ArgumentError::InvalidInteger {
        ty: ty.to_string(),
        value: match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    }
}

fn integer<T: TryFrom<u128>>(value: &Value, ty: &TypeTag) -> Result<T, ArgumentError> {
    let wide = match value {
        Value::Number(number) => number.as_u64().map(u128::from),
        Value::String(text) => text.trim().parse::<u128>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err(mismatch(ty, value));
        }
    };
    wide.and_then(|widened| T::try_from(widened).ok())
        .ok_or_else(|| invalid_integer(ty, value))
}

fn u256(value: &Value, ty: &TypeTag) -> Result<U256, ArgumentError> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| invalid_integer(ty, value)),
        Value::String(text) => text.trim().parse().map_err(|_err| invalid_integer(ty, value)),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            Err(mismatch(ty, value))
        }
    }
}

fn string<'json>(value: &'json Value, ty: &TypeTag) -> Result<&'json str, ArgumentError> {
    value.as_str().ok_or_else(|| mismatch(ty, value))
}

fn address(value: &Value, ty: &TypeTag) -> Result<AccountAddress, ArgumentError> {
    Ok(string(value, ty)?.parse()?)
}

fn encode_value(
    serializer: &mut bcs::Serializer,
    value: &Value,
    ty: &TypeTag,
) -> Result<(), ArgumentError> {
    match ty {
        TypeTag::Bool => match value {
            Value::Bool(flag) => serializer.serialize_bool(*flag),
            Value::String(text) if text == "true" || text == "false" => {
                serializer.serialize_bool(text == "true");
            }
            Value::Null
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_)
            | Value::Object(_) => return Err(mismatch(ty, value)),
        },
        TypeTag::U8 => serializer.serialize_u8(integer(value, ty)?),
        TypeTag::U16 => serializer.serialize_u16(integer(value, ty)?),
        TypeTag::U32 => serializer.serialize_u32(integer(value, ty)?),
        TypeTag::U64 => serializer.serialize_u64(integer(value, ty)?),
        TypeTag::U128 => serializer.serialize_u128(integer(value, ty)?),
        TypeTag::U256 => serializer.serialize_u256(&u256(value, ty)?),
        TypeTag::Address => address(value, ty)?.encode(serializer),
        TypeTag::Vector(inner) => match value {
            Value::String(text) if **inner == TypeTag::U8 => {
                serializer.serialize_bytes(&decode_hex(text)?);
            }
            Value::Array(items) => {
                serializer.serialize_len(items.len());
                for item in items {
                    encode_value(serializer, item, inner)?;
                }
            }
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Object(_) => return Err(mismatch(ty, value)),
        },
        TypeTag::Struct(tag) if tag.is_string() => serializer.serialize_str(string(value, ty)?),
        TypeTag::Struct(tag) if tag.is_object() => address(value, ty)?.encode(serializer),
        TypeTag::Struct(tag) if tag.is_option() => {
            let [inner] = tag.type_args.as_slice() else {
                return Err(ArgumentError::UnsupportedType(ty.to_string()));
            };
            if value.is_null() {
                serializer.serialize_len(0);
            } else {
                serializer.serialize_len(1);
                encode_value(serializer, value, inner)?;
            }
        }
        TypeTag::Signer | TypeTag::Reference(_) | TypeTag::Generic(_) | TypeTag::Struct(_) => {
            return Err(ArgumentError::UnsupportedType(ty.to_string()));
        }
    }
    Ok(())
}
