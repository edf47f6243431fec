//! # mock_chain
//!
//! An in-memory stand-in for the node lookups behind
//! [`ChainClient`]. Accounts, published entry functions and rotated keys
//! are seeded up front; every lookup is counted so tests can assert what
//! the builder fetched and what it served from its cache.
//!
//! ```
//! use aptos_client_core::{AccountAddress, ChainClient as _, primitives::ChainId};
//! use mock_chain::MockChain;
//!
//! let chain = MockChain::new(ChainId::LOCAL).with_account(AccountAddress::ONE, 7);
//! assert_eq!(chain.sequence_number(&AccountAddress::ONE), Ok(7));
//! assert_eq!(chain.calls().sequence_number, 1);
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use aptos_client_core::{
    AccountAddress, AuthenticationKey, ChainClient,
    builder::EntryFunctionAbi,
    primitives::{ChainId, Identifier, ModuleId},
};
use tracing::trace;

/// Lookup failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockChainError {
    /// No account at the address.
    #[error("account {0} not found")]
    AccountNotFound(AccountAddress),

    /// No such entry function.
    #[error("function {module}::{function} not found")]
    FunctionNotFound {
        /// The module.
        module: ModuleId,
        /// The function.
        function: Identifier,
    },

    /// The chain was taken offline with [`MockChain::set_offline`].
    #[error("node unreachable")]
    Offline,
}

/// How often each lookup ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// [`ChainClient::sequence_number`]
    pub sequence_number: usize,
    /// [`ChainClient::chain_id`]
    pub chain_id: usize,
    /// [`ChainClient::entry_function_abi`]
    pub entry_function_abi: usize,
    /// [`ChainClient::originating_address`]
    pub originating_address: usize,
}

#[derive(Debug, Default)]
struct Counters {
    sequence_number: AtomicUsize,
    chain_id: AtomicUsize,
    entry_function_abi: AtomicUsize,
    originating_address: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// A chain held in memory.
#[derive(Debug)]
pub struct MockChain {
    chain_id: ChainId,
    accounts: BTreeMap<AccountAddress, u64>,
    functions: BTreeMap<(ModuleId, Identifier), EntryFunctionAbi>,
    rotations: BTreeMap<[u8; 32], AccountAddress>,
    offline: AtomicBool,
    counters: Counters,
}

impl MockChain {
    /// An empty chain.
    #[must_use]
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            accounts: BTreeMap::new(),
            functions: BTreeMap::new(),
            rotations: BTreeMap::new(),
            offline: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Seed an account at `sequence_number`.
    #[must_use]
    pub fn with_account(mut self, address: AccountAddress, sequence_number: u64) -> Self {
        self.accounts.insert(address, sequence_number);
        self
    }

    /// Publish `module::function` with `abi`.
    #[must_use]
    pub fn with_function(
        mut self,
        module: ModuleId,
        function: Identifier,
        abi: EntryFunctionAbi,
    ) -> Self {
        self.functions.insert((module, function), abi);
        self
    }

    /// Record that `auth_key` was rotated into the account at `origin`.
    #[must_use]
    pub fn with_rotation(mut self, auth_key: &AuthenticationKey, origin: AccountAddress) -> Self {
        self.rotations.insert(auth_key.to_bytes(), origin);
        self
    }

    /// Advance the sender's sequence number, as a committed transaction
    /// would. Unknown senders start at zero.
    pub fn commit(&mut self, sender: AccountAddress) {
        let sequence_number = self.accounts.entry(sender).or_default();
        *sequence_number += 1;
        trace!(%sender, sequence_number = *sequence_number, "committed");
    }

    /// Fail every lookup with [`MockChainError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Lookups so far.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            sequence_number: self.counters.sequence_number.load(Ordering::Relaxed),
            chain_id: self.counters.chain_id.load(Ordering::Relaxed),
            entry_function_abi: self.counters.entry_function_abi.load(Ordering::Relaxed),
            originating_address: self.counters.originating_address.load(Ordering::Relaxed),
        }
    }

    fn online(&self) -> Result<(), MockChainError> {
        if self.offline.load(Ordering::Relaxed) {
            Err(MockChainError::Offline)
        } else {
            Ok(())
        }
    }
}

impl ChainClient for MockChain {
    type Error = MockChainError;

    fn sequence_number(&self, address: &AccountAddress) -> Result<u64, Self::Error> {
        bump(&self.counters.sequence_number);
        self.online()?;
        self.accounts
            .get(address)
            .copied()
            .ok_or(MockChainError::AccountNotFound(*address))
    }

    fn chain_id(&self) -> Result<u8, Self::Error> {
        bump(&self.counters.chain_id);
        self.online()?;
        Ok(self.chain_id.id())
    }

    fn entry_function_abi(
        &self,
        module: &ModuleId,
        function: &Identifier,
    ) -> Result<EntryFunctionAbi, Self::Error> {
        bump(&self.counters.entry_function_abi);
        self.online()?;
        self.functions
            .get(&(module.clone(), function.clone()))
            .cloned()
            .ok_or_else(|| MockChainError::FunctionNotFound {
                module: module.clone(),
                function: function.clone(),
            })
    }

    fn originating_address(
        &self,
        auth_key: &AuthenticationKey,
    ) -> Result<Option<AccountAddress>, Self::Error> {
        bump(&self.counters.originating_address);
        self.online()?;
        Ok(self.rotations.get(auth_key.as_bytes()).copied())
    }
}

#[cfg(test)]
mod tests {
    use aptos_client_core::type_tag::TypeTag;

    use super::*;

    fn transfer() -> (ModuleId, Identifier) {
        (
            "0x1::aptos_account".parse().unwrap(),
            Identifier::new("transfer").unwrap(),
        )
    }

    #[test]
    fn seeded_lookups() {
        let (module, function) = transfer();
        let abi = EntryFunctionAbi::new(0, vec![TypeTag::Address, TypeTag::U64]);
        let chain = MockChain::new(ChainId::TESTNET)
            .with_account(AccountAddress::ONE, 3)
            .with_function(module.clone(), function.clone(), abi.clone());

        assert_eq!(chain.chain_id(), Ok(2));
        assert_eq!(chain.sequence_number(&AccountAddress::ONE), Ok(3));
        assert_eq!(
            chain.sequence_number(&AccountAddress::A),
            Err(MockChainError::AccountNotFound(AccountAddress::A))
        );
        assert_eq!(chain.entry_function_abi(&module, &function), Ok(abi));
        assert!(matches!(
            chain.entry_function_abi(&module, &Identifier::new("mint").unwrap()),
            Err(MockChainError::FunctionNotFound { .. })
        ));
        assert_eq!(
            chain.calls(),
            CallCounts {
                sequence_number: 2,
                chain_id: 1,
                entry_function_abi: 2,
                originating_address: 0,
            }
        );
    }

    #[test]
    fn commits_advance_sequence_numbers() {
        let mut chain = MockChain::new(ChainId::LOCAL).with_account(AccountAddress::ONE, 3);
        chain.commit(AccountAddress::ONE);
        chain.commit(AccountAddress::A);
        assert_eq!(chain.sequence_number(&AccountAddress::ONE), Ok(4));
        assert_eq!(chain.sequence_number(&AccountAddress::A), Ok(1));
    }

    #[test]
    fn rotations() {
        let rotated = AuthenticationKey::from([5; 32]);
        let chain =
            MockChain::new(ChainId::LOCAL).with_rotation(&rotated, AccountAddress::FOUR);
        assert_eq!(chain.originating_address(&rotated), Ok(Some(AccountAddress::FOUR)));
        assert_eq!(
            chain.originating_address(&AuthenticationKey::from([6; 32])),
            Ok(None)
        );
    }

    /// Offline lookups fail but still count.
    #[test]
    fn offline() {
        let chain = MockChain::new(ChainId::LOCAL);
        chain.set_offline(true);
        assert_eq!(chain.chain_id(), Err(MockChainError::Offline));
        chain.set_offline(false);
        assert_eq!(chain.chain_id(), Ok(4));
        assert_eq!(chain.calls().chain_id, 2);
    }
}
