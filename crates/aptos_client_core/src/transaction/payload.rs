//! What a transaction executes.
//!
//! | `TransactionPayload` | tag | body                              |
//! |----------------------|----:|-----------------------------------|
//! | Script               | 0   | [`Script`]                        |
//! | EntryFunction        | 2   | [`EntryFunction`]                 |
//! | Multisig             | 3   | [`Multisig`]                      |
//! | Payload              | 4   | [`TransactionInnerPayload`]       |
//!
//! Tag 1 (module bundles) is retired. The inner payload separates what to
//! run ([`TransactionExecutable`]) from how to run it
//! ([`TransactionExtraConfig`]), so new options do not need new top-level
//! tags.

use core::iter;

use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    primitives::{AccountAddress, Identifier, ModuleId, U256},
    type_tag::TypeTag,
};

/// A payload that cannot be submitted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// References and generic placeholders only describe ABIs.
    #[error("type argument {0} cannot be used in a transaction")]
    AbiOnlyTypeArgument(String),
}

fn check_type_args(ty_args: &[TypeTag]) -> Result<(), PayloadError> {
    match ty_args.iter().find(|tag| tag.is_abi_only()) {
        Some(tag) => Err(PayloadError::AbiOnlyTypeArgument(tag.to_string())),
        None => Ok(()),
    }
}

/// A typed script argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptArgument {
    /// Tag 0.
    U8(u8),
    /// Tag 1.
    U64(u64),
    /// Tag 2.
    U128(u128),
    /// Tag 3.
    Address(AccountAddress),
    /// Tag 4.
    U8Vector(Vec<u8>),
    /// Tag 5.
    Bool(bool),
    /// Tag 6.
    U16(u16),
    /// Tag 7.
    U32(u32),
    /// Tag 8.
    U256(U256),
    /// Tag 9: pre-encoded bytes of any other type.
    Serialized(Vec<u8>),
}

impl Encode for ScriptArgument {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::U8(value) => {
                serializer.serialize_variant(0);
                serializer.serialize_u8(*value);
            }
            Self::U64(value) => {
                serializer.serialize_variant(1);
                serializer.serialize_u64(*value);
            }
            Self::U128(value) => {
                serializer.serialize_variant(2);
                serializer.serialize_u128(*value);
            }
            Self::Address(address) => {
                serializer.serialize_variant(3);
                address.encode(serializer);
            }
            Self::U8Vector(bytes) => {
                serializer.serialize_variant(4);
                serializer.serialize_bytes(bytes);
            }
            Self::Bool(value) => {
                serializer.serialize_variant(5);
                serializer.serialize_bool(*value);
            }
            Self::U16(value) => {
                serializer.serialize_variant(6);
                serializer.serialize_u16(*value);
            }
            Self::U32(value) => {
                serializer.serialize_variant(7);
                serializer.serialize_u32(*value);
            }
            Self::U256(value) => {
                serializer.serialize_variant(8);
                serializer.serialize_u256(value);
            }
            Self::Serialized(bytes) => {
                serializer.serialize_variant(9);
                serializer.serialize_bytes(bytes);
            }
        }
    }
}

impl Decode for ScriptArgument {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(match deserializer.deserialize_variant()? {
            0 => Self::U8(deserializer.deserialize_u8()?),
            1 => Self::U64(deserializer.deserialize_u64()?),
            2 => Self::U128(deserializer.deserialize_u128()?),
            3 => Self::Address(deserializer.deserialize()?),
            4 => Self::U8Vector(deserializer.deserialize_bytes()?),
            5 => Self::Bool(deserializer.deserialize_bool()?),
            6 => Self::U16(deserializer.deserialize_u16()?),
            7 => Self::U32(deserializer.deserialize_u32()?),
            8 => Self::U256(deserializer.deserialize_u256()?),
            9 => Self::Serialized(deserializer.deserialize_bytes()?),
            tag => {
                return Err(DecodeError::UnknownVariant {
                    type_name: "ScriptArgument",
                    tag,
                });
            }
        })
    }
}

/// Move bytecode run once, with type and value arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    code: Vec<u8>,
    ty_args: Vec<TypeTag>,
    args: Vec<ScriptArgument>,
}

impl Script {
    /// A script; type arguments must be concrete.
    pub fn new(
        code: Vec<u8>,
        ty_args: Vec<TypeTag>,
        args: Vec<ScriptArgument>,
    ) -> Result<Self, PayloadError> {
        check_type_args(&ty_args)?;
        Ok(Self {
            code,
            ty_args,
            args,
        })
    }

    /// The bytecode.
    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Type arguments.
    #[must_use]
    pub fn ty_args(&self) -> &[TypeTag] {
        &self.ty_args
    }

    /// Value arguments.
    #[must_use]
    pub fn args(&self) -> &[ScriptArgument] {
        &self.args
    }
}

impl Encode for Script {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_bytes(&self.code);
        serializer.serialize_vec(&self.ty_args);
        serializer.serialize_vec(&self.args);
    }
}

impl Decode for Script {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let code = deserializer.deserialize_bytes()?;
        let ty_args = deserializer.deserialize_vec()?;
        let args = deserializer.deserialize_vec()?;
        Self::new(code, ty_args, args).map_err(|err| DecodeError::invalid("Script", err))
    }
}

/// A call to a published `entry fun`, with BCS-encoded arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryFunction {
    module: ModuleId,
    function: Identifier,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
}

impl EntryFunction {
    /// An entry function call; type arguments must be concrete.
    pub fn new(
        module: ModuleId,
        function: Identifier,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> Result<Self, PayloadError> {
        check_type_args(&ty_args)?;
        Ok(Self {
            module,
            function,
            ty_args,
            args,
        })
    }

    /// The module.
    #[must_use]
    pub const fn module(&self) -> &ModuleId {
        &self.module
    }

    /// The function name.
    #[must_use]
    pub const fn function(&self) -> &Identifier {
        &self.function
    }

    /// Type arguments.
    #[must_use]
    pub fn ty_args(&self) -> &[TypeTag] {
        &self.ty_args
    }

    /// Encoded arguments.
    #[must_use]
    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }
}

impl Encode for EntryFunction {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.module.encode(serializer);
        self.function.encode(serializer);
        serializer.serialize_vec(&self.ty_args);
        serializer.serialize_len(self.args.len());
        for arg in &self.args {
            serializer.serialize_bytes(arg);
        }
    }
}

impl Decode for EntryFunction {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let module = deserializer.deserialize()?;
        let function = deserializer.deserialize()?;
        let ty_args = deserializer.deserialize_vec()?;
        let count = deserializer.deserialize_len()?;
        let args = iter::repeat_with(|| deserializer.deserialize_bytes())
            .take(count)
            .collect::<Result<_, _>>()?;
        Self::new(module, function, ty_args, args)
            .map_err(|err| DecodeError::invalid("EntryFunction", err))
    }
}

/// The call a multisig account votes on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultisigTransactionPayload {
    /// Tag 0.
    EntryFunction(EntryFunction),
}

impl Encode for MultisigTransactionPayload {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::EntryFunction(function) => {
                serializer.serialize_variant(0);
                function.encode(serializer);
            }
        }
    }
}

impl Decode for MultisigTransactionPayload {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::EntryFunction),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "MultisigTransactionPayload",
                tag,
            }),
        }
    }
}

/// Execute a transaction approved by an on-chain multisig account.
///
/// Without a payload the call stored on chain is executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multisig {
    /// The multisig account.
    pub multisig_address: AccountAddress,
    /// The approved call, if not already stored on chain.
    pub transaction_payload: Option<MultisigTransactionPayload>,
}

impl Encode for Multisig {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.multisig_address.encode(serializer);
        self.transaction_payload.encode(serializer);
    }
}

impl Decode for Multisig {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            multisig_address: deserializer.deserialize()?,
            transaction_payload: deserializer.deserialize_option()?,
        })
    }
}

/// What an inner payload runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionExecutable {
    /// Tag 0.
    Script(Script),
    /// Tag 1.
    EntryFunction(EntryFunction),
    /// Tag 2: nothing, e.g. a multisig vote on a stored call.
    Empty,
}

impl Encode for TransactionExecutable {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Script(script) => {
                serializer.serialize_variant(0);
                script.encode(serializer);
            }
            Self::EntryFunction(function) => {
                serializer.serialize_variant(1);
                function.encode(serializer);
            }
            Self::Empty => serializer.serialize_variant(2),
        }
    }
}

impl Decode for TransactionExecutable {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Script),
            1 => deserializer.deserialize().map(Self::EntryFunction),
            2 => Ok(Self::Empty),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "TransactionExecutable",
                tag,
            }),
        }
    }
}

/// How an inner payload runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionExtraConfig {
    /// Tag 0.
    V1 {
        /// Execute on behalf of this multisig account.
        multisig_address: Option<AccountAddress>,
        /// Replay protection by nonce instead of sequence number.
        replay_protection_nonce: Option<u64>,
    },
}

impl Default for TransactionExtraConfig {
    fn default() -> Self {
        Self::V1 {
            multisig_address: None,
            replay_protection_nonce: None,
        }
    }
}

impl TransactionExtraConfig {
    /// The multisig account, if any.
    #[must_use]
    pub const fn multisig_address(&self) -> Option<&AccountAddress> {
        match self {
            Self::V1 {
                multisig_address, ..
            } => multisig_address.as_ref(),
        }
    }

    /// The replay protection nonce, if any.
    #[must_use]
    pub const fn replay_protection_nonce(&self) -> Option<u64> {
        match self {
            Self::V1 {
                replay_protection_nonce,
                ..
            } => *replay_protection_nonce,
        }
    }
}

impl Encode for TransactionExtraConfig {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::V1 {
                multisig_address,
                replay_protection_nonce,
            } => {
                serializer.serialize_variant(0);
                multisig_address.encode(serializer);
                replay_protection_nonce.encode(serializer);
            }
        }
    }
}

impl Decode for TransactionExtraConfig {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => Ok(Self::V1 {
                multisig_address: deserializer.deserialize_option()?,
                replay_protection_nonce: deserializer.deserialize_option()?,
            }),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "TransactionExtraConfig",
                tag,
            }),
        }
    }
}

/// The versioned payload body behind tag 4.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionInnerPayload {
    /// Tag 0.
    V1 {
        /// What to run.
        executable: TransactionExecutable,
        /// How to run it.
        extra_config: TransactionExtraConfig,
    },
}

impl TransactionInnerPayload {
    /// Upgrade any payload to the inner form with `extra_config`.
    ///
    /// A legacy multisig payload moves its address into the extra config
    /// unless `extra_config` already names one. An inner payload keeps its
    /// executable and takes the new config.
    #[must_use]
    pub fn from_legacy(payload: TransactionPayload, extra_config: TransactionExtraConfig) -> Self {
        let (executable, extra_config) = match payload {
            TransactionPayload::Script(script) => {
                (TransactionExecutable::Script(script), extra_config)
            }
            TransactionPayload::EntryFunction(function) => {
                (TransactionExecutable::EntryFunction(function), extra_config)
            }
            TransactionPayload::Multisig(multisig) => {
                let executable = match multisig.transaction_payload {
                    Some(MultisigTransactionPayload::EntryFunction(function)) => {
                        TransactionExecutable::EntryFunction(function)
                    }
                    None => TransactionExecutable::Empty,
                };
                let TransactionExtraConfig::V1 {
                    multisig_address,
                    replay_protection_nonce,
                } = extra_config;
                let merged = TransactionExtraConfig::V1 {
                    multisig_address: multisig_address.or(Some(multisig.multisig_address)),
                    replay_protection_nonce,
                };
                (executable, merged)
            }
            TransactionPayload::Payload(Self::V1 { executable, .. }) => (executable, extra_config),
        };
        Self::V1 {
            executable,
            extra_config,
        }
    }

    /// What to run.
    #[must_use]
    pub const fn executable(&self) -> &TransactionExecutable {
        match self {
            Self::V1 { executable, .. } => executable,
        }
    }

    /// How to run it.
    #[must_use]
    pub const fn extra_config(&self) -> &TransactionExtraConfig {
        match self {
            Self::V1 { extra_config, .. } => extra_config,
        }
    }
}

impl Encode for TransactionInnerPayload {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::V1 {
                executable,
                extra_config,
            } => {
                serializer.serialize_variant(0);
                executable.encode(serializer);
                extra_config.encode(serializer);
            }
        }
    }
}

impl Decode for TransactionInnerPayload {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => Ok(Self::V1 {
                executable: deserializer.deserialize()?,
                extra_config: deserializer.deserialize()?,
            }),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "TransactionInnerPayload",
                tag,
            }),
        }
    }
}

/// A transaction payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionPayload {
    /// Tag 0.
    Script(Script),
    /// Tag 2.
    EntryFunction(EntryFunction),
    /// Tag 3.
    Multisig(Multisig),
    /// Tag 4.
    Payload(TransactionInnerPayload),
}

impl TransactionPayload {
    /// The ULEB128 variant tag.
    #[must_use]
    pub const fn variant_index(&self) -> u32 {
        match self {
            Self::Script(_) => 0,
            Self::EntryFunction(_) => 2,
            Self::Multisig(_) => 3,
            Self::Payload(_) => 4,
        }
    }

    /// The replay protection nonce, for inner payloads that carry one.
    #[must_use]
    pub const fn replay_protection_nonce(&self) -> Option<u64> {
        match self {
            Self::Payload(inner) => inner.extra_config().replay_protection_nonce(),
            Self::Script(_) | Self::EntryFunction(_) | Self::Multisig(_) => None,
        }
    }
}

impl From<Script> for TransactionPayload {
    fn from(script: Script) -> Self {
        Self::Script(script)
    }
}

impl From<EntryFunction> for TransactionPayload {
    fn from(function: EntryFunction) -> Self {
        Self::EntryFunction(function)
    }
}

impl From<Multisig> for TransactionPayload {
    fn from(multisig: Multisig) -> Self {
        Self::Multisig(multisig)
    }
}

impl From<TransactionInnerPayload> for TransactionPayload {
    fn from(inner: TransactionInnerPayload) -> Self {
        Self::Payload(inner)
    }
}

impl Encode for TransactionPayload {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_variant(self.variant_index());
        match self {
            Self::Script(script) => script.encode(serializer),
            Self::EntryFunction(function) => function.encode(serializer),
            Self::Multisig(multisig) => multisig.encode(serializer),
            Self::Payload(inner) => inner.encode(serializer),
        }
    }
}

impl Decode for TransactionPayload {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Script),
            2 => deserializer.deserialize().map(Self::EntryFunction),
            3 => deserializer.deserialize().map(Self::Multisig),
            4 => deserializer.deserialize().map(Self::Payload),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "TransactionPayload",
                tag,
            }),
        }
    }
}
