//! # aptos_client_core
//!
//! Client-side core of the Aptos blockchain: everything a wallet or SDK
//! needs between "the user wants to call this function" and "these bytes
//! go to a node".
//!
//! - **Canonical encoding**: [`bcs`] gives every value exactly one byte
//!   string, so hashes, signing messages and addresses agree with the
//!   chain.
//! - **Keys and accounts**: Ed25519, Secp256k1, K-of-N [`MultiKey`]s and
//!   OIDC-backed [`keyless`] accounts, all signing through
//!   [`AccountSigner`].
//! - **Transactions**: payloads, the four authenticator topologies, and a
//!   [`TransactionBuilder`] that fills in what the chain knows through a
//!   [`ChainClient`].
//!
//! ## Signing flow
//!
//! ```mermaid
//! flowchart LR
//!     tx[TransactionBuilder] --> raw[AnyRawTransaction]
//!     raw -- "domain prefix + BCS" --> msg[signing message]
//!     msg --> acct[AccountSigner]
//!     acct --> auth[AccountAuthenticator]
//!     auth --> signed[SignedTransaction]
//! ```
//!
//! ## Nomenclature
//!
//! Addresses, keys and authenticators are the chain's types, byte-for-byte;
//! the builder, [`ChainCache`] and JSON envelopes are client conveniences
//! with no on-chain counterpart.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![expect(clippy::pub_use, reason = "exporting items for consumers")]
#![expect(
    clippy::module_name_repetitions,
    reason = "types keep the names the chain gives them"
)]
#![expect(
    clippy::pattern_type_mismatch,
    reason = "borrowed enum matches would need ref bindings"
)]

extern crate alloc;

pub mod account;
pub mod bcs;
pub mod builder;
pub mod constants;
pub mod json;
pub mod keyless;
pub mod keys;
pub mod primitives;
pub mod transaction;
pub mod type_tag;

pub use account::{Account, AccountSigner, SigningError};
pub use builder::{
    BuildError, BuilderConfig, ChainCache, ChainClient, TransactionBuilder, TransactionOptions,
};
pub use keys::{AnyPublicKey, AnySignature, AuthenticationKey, MultiKey, PrivateKey};
pub use primitives::{AccountAddress, ChainId, Hex, U256};
pub use transaction::{
    AnyRawTransaction, RawTransaction, SignedTransaction, TransactionAuthenticator,
    TransactionPayload,
};
pub use type_tag::TypeTag;
