//! ## Transaction building
//!
//! Building a transaction is two phases, mirroring who holds what:
//!
//! 1. The [`TransactionBuilder`] assembles an unsigned
//!    [`AnyRawTransaction`] from a sender, a payload and
//!    [`TransactionOptions`], asking its [`ChainClient`] for anything the
//!    caller left out (sequence number, chain id, ABIs).
//! 2. [`sign_and_build`] collects an authenticator from every required
//!    signer and wraps them in the authenticator matching the topology.
//!    Signers that sign on different devices use [`assemble`] instead.
//!
//! ```mermaid
//! flowchart LR
//!     opts[TransactionOptions] --> b[TransactionBuilder]
//!     client[ChainClient] -- "seq, chain id, ABI" --> b
//!     b --> raw[AnyRawTransaction]
//!     raw --> s[sign_and_build]
//!     signers[AccountSigner × n] --> s
//!     s --> signed[SignedTransaction]
//! ```
//!
//! Requesting a replay-protection nonce or a multisig address upgrades the
//! payload to the inner-payload form, since legacy payloads cannot carry
//! either. A nonce without an explicit sequence number makes the
//! transaction orderless: no sequence number is fetched.

pub mod abi;
mod client;
mod sign;

use core::convert::Infallible;

use tracing::debug;

// Re-exports: public API surface.
pub use abi::{ArgumentError, EntryFunctionAbi};
pub use client::{ChainCache, ChainClient};
pub use sign::{assemble, sign_and_build};

use crate::{
    account::SigningError,
    constants::{
        DEFAULT_GAS_UNIT_PRICE, DEFAULT_MAX_GAS_AMOUNT, DEFAULT_TXN_EXPIRY_SECS,
        ORDERLESS_SEQUENCE_NUMBER,
    },
    keys::AuthenticationKey,
    primitives::{AccountAddress, ChainId, Identifier, ModuleId, now_secs},
    transaction::{
        AnyRawTransaction, EntryFunction, PayloadError, RawTransaction, TransactionExtraConfig,
        TransactionInnerPayload, TransactionPayload,
    },
    type_tag::TypeTag,
};

/// Defaults applied to every transaction a builder produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Gas limit.
    pub max_gas_amount: u64,
    /// Octas per gas unit.
    pub gas_unit_price: u64,
    /// Seconds from build time until expiry.
    pub expiration_secs: u64,
    /// Fixed chain id; fetched from the client when `None`.
    pub chain_id: Option<ChainId>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: DEFAULT_MAX_GAS_AMOUNT,
            gas_unit_price: DEFAULT_GAS_UNIT_PRICE,
            expiration_secs: DEFAULT_TXN_EXPIRY_SECS,
            chain_id: None,
        }
    }
}

/// Per-transaction overrides. Unset fields fall back to the
/// [`BuilderConfig`] or a chain lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Gas limit.
    pub max_gas_amount: Option<u64>,
    /// Octas per gas unit.
    pub gas_unit_price: Option<u64>,
    /// Absolute expiry, in seconds since the epoch.
    pub expiration_timestamp_secs: Option<u64>,
    /// Sender sequence number.
    pub sequence_number: Option<u64>,
    /// Replay-protection nonce for orderless transactions.
    pub replay_protection_nonce: Option<u64>,
    /// Multisig account to execute as.
    pub multisig_address: Option<AccountAddress>,
}

impl TransactionOptions {
    fn extra_config(&self) -> Option<TransactionExtraConfig> {
        if self.replay_protection_nonce.is_none() && self.multisig_address.is_none() {
            return None;
        }
        Some(TransactionExtraConfig::V1 {
            multisig_address: self.multisig_address,
            replay_protection_nonce: self.replay_protection_nonce,
        })
    }
}

/// Transaction building failures. `E` is the client's error type.
#[derive(Debug, thiserror::Error)]
pub enum BuildError<E = Infallible> {
    /// A chain lookup failed.
    #[error("chain lookup failed: {0}")]
    Client(E),

    /// JSON arguments did not match the ABI.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The payload could not be constructed.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A signer failed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Not of the form `address::module::function`.
    #[error("invalid entry function id '{0}'")]
    InvalidFunctionId(String),

    /// Secondary signers do not match the transaction's list.
    #[error("expected {expected} secondary signers, got {actual}")]
    SecondarySignerCount {
        /// Addresses in the transaction.
        expected: usize,
        /// Signers given.
        actual: usize,
    },

    /// A signer for the wrong account.
    #[error("expected a signer for {expected}, got {actual}")]
    SignerMismatch {
        /// The address in the transaction.
        expected: AccountAddress,
        /// The signer's address.
        actual: AccountAddress,
    },

    /// A fee payer signer for a transaction without a fee payer.
    #[error("only fee payer transactions take a fee payer signer")]
    UnexpectedFeePayer,
}

/// Split `0x1::coin::transfer` into module and function.
fn parse_function_id(function_id: &str) -> Option<(ModuleId, Identifier)> {
    let (module, function) = function_id.trim().rsplit_once("::")?;
    Some((module.parse().ok()?, function.parse().ok()?))
}

/// Builds unsigned transactions against a chain.
#[derive(Debug)]
pub struct TransactionBuilder<'client, C> {
    client: &'client C,
    config: BuilderConfig,
    cache: ChainCache,
}

impl<'client, C: ChainClient> TransactionBuilder<'client, C> {
    /// A builder with an empty cache.
    #[must_use]
    pub fn new(client: &'client C, config: BuilderConfig) -> Self {
        Self::with_cache(client, config, ChainCache::new())
    }

    /// A builder reusing a cache from an earlier builder.
    #[must_use]
    pub const fn with_cache(client: &'client C, config: BuilderConfig, cache: ChainCache) -> Self {
        Self {
            client,
            config,
            cache,
        }
    }

    /// The defaults in use.
    #[must_use]
    pub const fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Hand the cache back for the next builder.
    #[must_use]
    pub fn into_cache(self) -> ChainCache {
        self.cache
    }

    /// An entry function call with JSON arguments, converted through the
    /// function's ABI. `function_id` is `address::module::function`.
    pub fn entry_function(
        &mut self,
        function_id: &str,
        type_args: Vec<TypeTag>,
        args: &[serde_json::Value],
    ) -> Result<EntryFunction, BuildError<C::Error>> {
        let (module, function) = parse_function_id(function_id)
            .ok_or_else(|| BuildError::InvalidFunctionId(function_id.to_owned()))?;
        let abi = self
            .cache
            .entry_function_abi(self.client, &module, &function)
            .map_err(BuildError::Client)?;
        let encoded = abi.encode_arguments(&type_args, args)?;
        Ok(EntryFunction::new(module, function, type_args, encoded)?)
    }

    /// The raw transaction, with options resolved against the config and
    /// the chain.
    pub fn build_raw(
        &mut self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: TransactionOptions,
    ) -> Result<RawTransaction, BuildError<C::Error>> {
        let upgraded = match options.extra_config() {
            Some(extra_config) => {
                debug!(
                    orderless = options.replay_protection_nonce.is_some(),
                    multisig = options.multisig_address.is_some(),
                    "upgrading payload to inner payload"
                );
                TransactionInnerPayload::from_legacy(payload, extra_config).into()
            }
            None => payload,
        };
        let sequence_number = match (options.sequence_number, options.replay_protection_nonce) {
            (Some(sequence_number), _) => sequence_number,
            (None, Some(_)) => ORDERLESS_SEQUENCE_NUMBER,
            (None, None) => {
                let fetched = self
                    .client
                    .sequence_number(&sender)
                    .map_err(BuildError::Client)?;
                debug!(%sender, sequence_number = fetched, "fetched sequence number");
                fetched
            }
        };
        let chain_id = match self.config.chain_id {
            Some(chain_id) => chain_id,
            None => self.cache.chain_id(self.client).map_err(BuildError::Client)?,
        };
        let expiration_timestamp_secs = options
            .expiration_timestamp_secs
            .unwrap_or_else(|| now_secs().saturating_add(self.config.expiration_secs));
        Ok(RawTransaction {
            sender,
            sequence_number,
            payload: upgraded,
            max_gas_amount: options.max_gas_amount.unwrap_or(self.config.max_gas_amount),
            gas_unit_price: options.gas_unit_price.unwrap_or(self.config.gas_unit_price),
            expiration_timestamp_secs,
            chain_id,
        })
    }

    /// A transaction signed by the sender alone.
    pub fn build_simple(
        &mut self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: TransactionOptions,
    ) -> Result<AnyRawTransaction, BuildError<C::Error>> {
        let raw_txn = self.build_raw(sender, payload, options)?;
        Ok(AnyRawTransaction::Simple(raw_txn))
    }

    /// A transaction co-signed by `secondary_signers`, in order.
    pub fn build_multi_agent(
        &mut self,
        sender: AccountAddress,
        secondary_signers: Vec<AccountAddress>,
        payload: TransactionPayload,
        options: TransactionOptions,
    ) -> Result<AnyRawTransaction, BuildError<C::Error>> {
        let raw_txn = self.build_raw(sender, payload, options)?;
        Ok(AnyRawTransaction::new(raw_txn, secondary_signers, None))
    }

    /// A sponsored transaction. The fee payer is `0x0` until the sponsor
    /// signs, so the sender can sign without knowing who pays.
    pub fn build_fee_payer(
        &mut self,
        sender: AccountAddress,
        secondary_signers: Vec<AccountAddress>,
        payload: TransactionPayload,
        options: TransactionOptions,
    ) -> Result<AnyRawTransaction, BuildError<C::Error>> {
        let raw_txn = self.build_raw(sender, payload, options)?;
        Ok(AnyRawTransaction::new(
            raw_txn,
            secondary_signers,
            Some(AccountAddress::ZERO),
        ))
    }

    /// The address `auth_key` signs for: the originating address of a
    /// rotated key, otherwise the key's own address.
    pub fn resolve_address(
        &self,
        auth_key: &AuthenticationKey,
    ) -> Result<AccountAddress, BuildError<C::Error>> {
        let address = self
            .client
            .originating_address(auth_key)
            .map_err(BuildError::Client)?;
        Ok(address.unwrap_or_else(|| auth_key.account_address()))
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Offline;

    /// Answers every lookup with fixed values and counts sequence
    /// number lookups.
    #[derive(Default)]
    struct Fixed {
        sequence_calls: Cell<usize>,
        fail: bool,
    }

    impl ChainClient for Fixed {
        type Error = Offline;

        fn sequence_number(&self, _address: &AccountAddress) -> Result<u64, Offline> {
            self.sequence_calls.set(self.sequence_calls.get() + 1);
            if self.fail { Err(Offline) } else { Ok(9) }
        }

        fn chain_id(&self) -> Result<u8, Offline> {
            if self.fail { Err(Offline) } else { Ok(2) }
        }

        fn entry_function_abi(
            &self,
            _module: &ModuleId,
            _function: &Identifier,
        ) -> Result<EntryFunctionAbi, Offline> {
            Ok(EntryFunctionAbi::parse(0, &["&signer", "address", "u64"]).unwrap())
        }

        fn originating_address(
            &self,
            auth_key: &AuthenticationKey,
        ) -> Result<Option<AccountAddress>, Offline> {
            Ok((auth_key.as_bytes()[0] == 0xaa).then_some(AccountAddress::A))
        }
    }

    fn payload(builder: &mut TransactionBuilder<'_, Fixed>) -> TransactionPayload {
        builder
            .entry_function(
                "0x1::aptos_account::transfer",
                vec![],
                &[serde_json::json!("0x4"), serde_json::json!(5)],
            )
            .unwrap()
            .into()
    }

    /// Unset options come from the config and the chain.
    #[test]
    fn defaults_and_lookups() {
        let client = Fixed::default();
        let mut builder = TransactionBuilder::new(&client, BuilderConfig::default());
        let payload = payload(&mut builder);
        let before = now_secs();
        let raw = builder
            .build_raw(AccountAddress::ONE, payload, TransactionOptions::default())
            .unwrap();
        assert_eq!(raw.sequence_number, 9);
        assert_eq!(raw.chain_id, ChainId::TESTNET);
        assert_eq!(raw.max_gas_amount, 200_000);
        assert_eq!(raw.gas_unit_price, 100);
        assert!(raw.expiration_timestamp_secs >= before + 20);
        assert!(raw.expiration_timestamp_secs <= now_secs() + 20);
        assert!(matches!(raw.payload, TransactionPayload::EntryFunction(_)));
    }

    /// A nonce upgrades the payload and skips the sequence number lookup.
    #[test]
    fn orderless_transaction() {
        let client = Fixed::default();
        let mut builder = TransactionBuilder::new(&client, BuilderConfig::default());
        let payload = payload(&mut builder);
        let options = TransactionOptions {
            replay_protection_nonce: Some(77),
            ..TransactionOptions::default()
        };
        let raw = builder.build_raw(AccountAddress::ONE, payload, options).unwrap();
        assert_eq!(raw.sequence_number, ORDERLESS_SEQUENCE_NUMBER);
        assert_eq!(raw.payload.replay_protection_nonce(), Some(77));
        assert_eq!(raw.payload.variant_index(), 4);
        assert_eq!(client.sequence_calls.get(), 0);
    }

    #[test]
    fn fee_payer_placeholder() {
        let client = Fixed::default();
        let mut builder = TransactionBuilder::new(&client, BuilderConfig::default());
        let payload = payload(&mut builder);
        let options = TransactionOptions {
            sequence_number: Some(0),
            ..TransactionOptions::default()
        };
        let txn = builder
            .build_fee_payer(AccountAddress::ONE, vec![], payload, options)
            .unwrap();
        assert_eq!(txn.fee_payer_address(), Some(&AccountAddress::ZERO));
        assert_eq!(client.sequence_calls.get(), 0);
    }

    /// Client errors surface unchanged.
    #[test]
    fn client_failure() {
        let client = Fixed {
            fail: true,
            ..Fixed::default()
        };
        let config = BuilderConfig {
            chain_id: Some(ChainId::LOCAL),
            ..BuilderConfig::default()
        };
        let mut builder = TransactionBuilder::new(&client, config);
        let payload = payload(&mut builder);
        assert!(matches!(
            builder.build_simple(AccountAddress::ONE, payload, TransactionOptions::default()),
            Err(BuildError::Client(Offline))
        ));
    }

    #[test]
    fn function_ids() {
        let client = Fixed::default();
        let mut builder = TransactionBuilder::new(&client, BuilderConfig::default());
        assert!(matches!(
            builder.entry_function("transfer", vec![], &[]),
            Err(BuildError::InvalidFunctionId(_))
        ));
        assert!(matches!(
            builder.entry_function("0x1::coin::transfer", vec![], &[]),
            Err(BuildError::Argument(ArgumentError::ArgumentCount { .. }))
        ));
        let (module, function) = parse_function_id("0x1::coin::transfer").unwrap();
        assert_eq!(module.to_string(), "0x1::coin");
        assert_eq!(function.as_str(), "transfer");
    }

    /// Rotated keys resolve to their originating address.
    #[test]
    fn originating_address() {
        let client = Fixed::default();
        let builder = TransactionBuilder::new(&client, BuilderConfig::default());
        let rotated = AuthenticationKey::from([0xaa; 32]);
        let fresh = AuthenticationKey::from([0xbb; 32]);
        assert_eq!(builder.resolve_address(&rotated).unwrap(), AccountAddress::A);
        assert_eq!(
            builder.resolve_address(&fresh).unwrap(),
            fresh.account_address()
        );
    }
}
