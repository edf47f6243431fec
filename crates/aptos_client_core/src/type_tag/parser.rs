//! Recursive-descent parser for Move type signatures.
//!
//! The parser walks the input once. `<` pushes a frame holding the text and
//! finished types seen so far at the outer level; `>` pops it and hands the
//! inner types to whatever name precedes the `<`. Commas separate sibling
//! arguments and are counted so the argument count can be checked when the
//! frame closes.
//!
//! Whitespace may follow a comma, or sit between a complete type and the
//! next `,` or `>`. Anywhere else it is an error, so `u8 u16` is rejected
//! rather than silently read as `u8`.

use core::{error, fmt, mem};

use super::{StructTag, TypeTag};
use crate::primitives::{AccountAddress, Identifier, is_valid_identifier};

/// Why a type signature was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeTagParseErrorKind {
    /// Not a primitive, vector, reference, generic or struct.
    #[error("unknown type")]
    InvalidTypeTag,
    /// `T<n>` outside ABI parsing.
    #[error("generic types are not allowed here")]
    UnexpectedGenericType,
    /// A `>` with no open `<`.
    #[error("unexpected '>'")]
    UnexpectedTypeArgumentClose,
    /// Whitespace inside a name or between two types.
    #[error("unexpected whitespace")]
    UnexpectedWhitespaceCharacter,
    /// A comma outside any `<...>`.
    #[error("unexpected ','")]
    UnexpectedComma,
    /// Commas and types inside `<...>` disagree.
    #[error("type argument count mismatch")]
    TypeArgumentCountMismatch,
    /// An open `<` never closed.
    #[error("missing '>'")]
    MissingTypeArgumentClose,
    /// A primitive followed by `<...>`.
    #[error("primitive types take no type arguments")]
    UnexpectedPrimitiveTypeArguments,
    /// `vector` with other than one argument.
    #[error("vector takes exactly one type argument")]
    UnexpectedVectorTypeArgumentCount,
    /// A struct path that is not `address::module::Name`.
    #[error("struct must be address::module::Name")]
    UnexpectedStructFormat,
    /// The module segment is not `[A-Za-z0-9_]+`.
    #[error("invalid module name")]
    InvalidModuleNameCharacter,
    /// The struct segment is not `[A-Za-z0-9_]+`.
    #[error("invalid struct name")]
    InvalidStructNameCharacter,
    /// The address segment is not an account address.
    #[error("invalid address")]
    InvalidAddress,
}

/// A type signature that failed to parse, with the full input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeTagParseError {
    /// The text handed to the parser.
    pub input: String,
    /// What went wrong.
    pub kind: TypeTagParseErrorKind,
}

impl fmt::Display for TypeTagParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "failed to parse type tag '{}': {}", self.input, self.kind)
    }
}

impl error::Error for TypeTagParseError {}

/// Outer-level state saved at each `<`.
struct Frame {
    expected: usize,
    text: String,
    types: Vec<TypeTag>,
}

/// Parse a Move type signature.
///
/// `allow_generics` admits `T0`, `T1`, ... placeholders, as found in
/// function ABIs. References (`&T`) are always accepted.
pub fn parse_type_tag(input: &str, allow_generics: bool) -> Result<TypeTag, TypeTagParseError> {
    parse(input, allow_generics).map_err(|kind| TypeTagParseError {
        input: input.to_owned(),
        kind,
    })
}

fn parse(input: &str, allow_generics: bool) -> Result<TypeTag, TypeTagParseErrorKind> {
    use TypeTagParseErrorKind as Kind;

    let mut saved: Vec<Frame> = Vec::new();
    let mut inner: Vec<TypeTag> = Vec::new();
    let mut types: Vec<TypeTag> = Vec::new();
    let mut text = String::new();
    let mut expected = 1usize;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                saved.push(Frame {
                    expected,
                    text: mem::take(&mut text),
                    types: mem::take(&mut types),
                });
                expected = 1;
            }
            '>' => {
                if !text.is_empty() {
                    types.push(parse_single(&text, mem::take(&mut inner), allow_generics)?);
                }
                let frame = saved.pop().ok_or(Kind::UnexpectedTypeArgumentClose)?;
                if expected != types.len() {
                    return Err(Kind::TypeArgumentCountMismatch);
                }
                inner = mem::replace(&mut types, frame.types);
                text = frame.text;
                expected = frame.expected;
            }
            ',' => {
                if saved.is_empty() {
                    return Err(Kind::UnexpectedComma);
                }
                if !text.is_empty() {
                    types.push(parse_single(
                        &mem::take(&mut text),
                        mem::take(&mut inner),
                        allow_generics,
                    )?);
                }
                expected += 1;
            }
            space if space.is_whitespace() => {
                while chars.next_if(|next| next.is_whitespace()).is_some() {}
                if !text.is_empty() {
                    // whitespace may only end a type, never split one
                    if chars.peek().is_some_and(|next| *next != ',' && *next != '>') {
                        return Err(Kind::UnexpectedWhitespaceCharacter);
                    }
                    types.push(parse_single(
                        &mem::take(&mut text),
                        mem::take(&mut inner),
                        allow_generics,
                    )?);
                }
            }
            other => text.push(other),
        }
    }

    if !saved.is_empty() {
        return Err(Kind::MissingTypeArgumentClose);
    }
    match types.len() {
        0 => parse_single(&text, inner, allow_generics),
        1 if text.is_empty() => types.pop().ok_or(Kind::InvalidTypeTag),
        1 => Err(Kind::UnexpectedComma),
        _ => Err(Kind::UnexpectedWhitespaceCharacter),
    }
}

/// `T` followed by one or more digits.
fn generic_index(text: &str) -> Option<&str> {
    text.strip_prefix('T')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()))
}

/// Parse one name with its already-parsed type arguments.
fn parse_single(
    text: &str,
    mut type_args: Vec<TypeTag>,
    allow_generics: bool,
) -> Result<TypeTag, TypeTagParseErrorKind> {
    use TypeTagParseErrorKind as Kind;

    let trimmed = text.trim();
    let primitive = match trimmed.to_ascii_lowercase().as_str() {
        "bool" => Some(TypeTag::Bool),
        "u8" => Some(TypeTag::U8),
        "u16" => Some(TypeTag::U16),
        "u32" => Some(TypeTag::U32),
        "u64" => Some(TypeTag::U64),
        "u128" => Some(TypeTag::U128),
        "u256" => Some(TypeTag::U256),
        "address" => Some(TypeTag::Address),
        "signer" => Some(TypeTag::Signer),
        "vector" => {
            return match (type_args.pop(), type_args.is_empty()) {
                (Some(element), true) => Ok(TypeTag::vector(element)),
                _ => Err(Kind::UnexpectedVectorTypeArgumentCount),
            };
        }
        _ => None,
    };
    if let Some(tag) = primitive {
        return if type_args.is_empty() {
            Ok(tag)
        } else {
            Err(Kind::UnexpectedPrimitiveTypeArguments)
        };
    }

    if let Some(referent) = trimmed.strip_prefix('&') {
        return parse_single(referent, type_args, allow_generics)
            .map(|tag| TypeTag::Reference(Box::new(tag)));
    }

    if let Some(digits) = generic_index(trimmed) {
        if !allow_generics {
            return Err(Kind::UnexpectedGenericType);
        }
        return digits
            .parse()
            .map(TypeTag::Generic)
            .map_err(|_err| Kind::InvalidTypeTag);
    }

    if !trimmed.contains(':') {
        return Err(Kind::InvalidTypeTag);
    }
    let parts: Vec<&str> = trimmed.split("::").collect();
    let [address, module, name] = parts.as_slice() else {
        return Err(Kind::UnexpectedStructFormat);
    };
    let address =
        AccountAddress::from_str_relaxed(address).map_err(|_err| Kind::InvalidAddress)?;
    if !is_valid_identifier(module) {
        return Err(Kind::InvalidModuleNameCharacter);
    }
    if !is_valid_identifier(name) {
        return Err(Kind::InvalidStructNameCharacter);
    }
    Ok(TypeTag::from(StructTag {
        address,
        module: Identifier::new(*module).map_err(|_err| Kind::InvalidModuleNameCharacter)?,
        name: Identifier::new(*name).map_err(|_err| Kind::InvalidStructNameCharacter)?,
        type_args,
    }))
}
