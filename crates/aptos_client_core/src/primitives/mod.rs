//! Value types shared by every layer: byte buffers, addresses, integers,
//! identifiers and chain ids.

mod address;
mod bytes;
mod identifier;
mod u256;

use core::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use address::{AccountAddress, AddressParseError};
pub use bytes::{Hex, HexError};
pub(crate) use bytes::decode_hex;
pub use identifier::{Identifier, IdentifierError, ModuleId};
pub(crate) use identifier::is_valid_identifier;
pub use u256::{U256, U256ParseError};

use crate::bcs::{self, Decode, DecodeError, Encode};

/// The network a transaction is valid on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChainId(u8);

impl ChainId {
    /// Mainnet.
    pub const MAINNET: Self = Self(1);
    /// Testnet.
    pub const TESTNET: Self = Self(2);
    /// A local testing node.
    pub const LOCAL: Self = Self(4);

    /// The raw id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }
}

impl From<u8> for ChainId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u8 {
    fn from(chain_id: ChainId) -> Self {
        chain_id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl Encode for ChainId {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_u8(self.0);
    }
}

impl Decode for ChainId {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_u8().map(Self)
    }
}

/// Seconds since the Unix epoch from the wall clock.
///
/// A clock before 1970 reads as zero.
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
