//! The builder's view of the network.
//!
//! The core never talks to a node itself. Whatever does (a REST client, an
//! indexer, a test double) implements [`ChainClient`], and the builder
//! calls it synchronously for the few values a transaction needs.
//! [`ChainCache`] keeps the values that do not change between
//! transactions so repeated builds skip the lookup.

use alloc::collections::{BTreeMap, btree_map::Entry};

use tracing::debug;

use super::abi::EntryFunctionAbi;
use crate::{
    keys::AuthenticationKey,
    primitives::{AccountAddress, ChainId, Identifier, ModuleId},
};

/// Chain lookups the builder depends on.
///
/// Implementations own transport, retries and timeouts; the builder calls
/// each method at most once per value and treats any error as final.
pub trait ChainClient {
    /// Error type for failed lookups.
    type Error;

    /// The account's next sequence number.
    fn sequence_number(&self, address: &AccountAddress) -> Result<u64, Self::Error>;

    /// The network's chain id.
    fn chain_id(&self) -> Result<u8, Self::Error>;

    /// Parameter types of a published entry function.
    fn entry_function_abi(
        &self,
        module: &ModuleId,
        function: &Identifier,
    ) -> Result<EntryFunctionAbi, Self::Error>;

    /// The address an authentication key was first used at, if the key was
    /// rotated into another account.
    fn originating_address(
        &self,
        auth_key: &AuthenticationKey,
    ) -> Result<Option<AccountAddress>, Self::Error>;
}

/// Memoized chain id and entry function ABIs.
///
/// Sequence numbers are never cached: they change with every committed
/// transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainCache {
    chain_id: Option<ChainId>,
    abis: BTreeMap<(ModuleId, Identifier), EntryFunctionAbi>,
}

impl ChainCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain id, fetched on first use.
    pub fn chain_id<C: ChainClient>(&mut self, client: &C) -> Result<ChainId, C::Error> {
        if let Some(chain_id) = self.chain_id {
            return Ok(chain_id);
        }
        let chain_id = ChainId::from(client.chain_id()?);
        debug!(%chain_id, "fetched chain id");
        self.chain_id = Some(chain_id);
        Ok(chain_id)
    }

    /// The ABI of `module::function`, fetched on first use.
    pub fn entry_function_abi<C: ChainClient>(
        &mut self,
        client: &C,
        module: &ModuleId,
        function: &Identifier,
    ) -> Result<&EntryFunctionAbi, C::Error> {
        match self.abis.entry((module.clone(), function.clone())) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let abi = client.entry_function_abi(module, function)?;
                debug!(%module, %function, "fetched entry function abi");
                Ok(entry.insert(abi))
            }
        }
    }

    /// Seed the chain id, e.g. from configuration.
    pub fn set_chain_id(&mut self, chain_id: ChainId) {
        self.chain_id = Some(chain_id);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.chain_id = None;
        self.abis.clear();
    }
}
