use {
  super::*,
  alloy_sol_types::{sol, SolCall, SolValue},
};

sol! {
  function addr(bytes32 node) external view returns (address);
  function addr(bytes32 node, uint256 coinType) external view returns (bytes);
  function text(bytes32 node, string key) external view returns (string);
  function contenthash(bytes32 node) external view returns (bytes);
  function pubkey(bytes32 node) external view returns (bytes32 x, bytes32 y);
  function name(bytes32 node) external view returns (string);
  function multicall(bytes[] data) external view returns (bytes[]);
}

/// A SLIP-44 coin type as carried by `addr(bytes32,uint256)`.
#[derive(
  Debug, Copy, Clone, PartialEq, Eq, derive_more::Display, derive_more::FromStr,
)]
pub struct CoinType(pub U256);

impl CoinType {
  pub const ETH: u64 = 60;

  /// The ENSIP-11 coin type for an EVM chain: bit 31 set, chain ID in the
  /// low bits.
  pub fn evm(chain_id: u32) -> Self {
    Self(U256::from(0x8000_0000u64 | u64::from(chain_id)))
  }

  /// True for coin types that are recognizably EVM-derived: the base
  /// Ethereum coin type, or an ENSIP-11 chain-ID encoding. Only these are
  /// eligible for default-address substitution.
  pub fn is_evm(self) -> bool {
    self.0 == U256::from(Self::ETH)
      || (self.0.bit(31) && self.0 < U256::from(1u64 << 32))
  }
}

/// One decoded resolver-profile call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCall {
  /// `addr(bytes32)`: the legacy Ethereum address record.
  AddrLegacy { node: B256 },
  /// `addr(bytes32,uint256)`: an address record for a specific coin type.
  Addr { node: B256, coin_type: CoinType },
  /// `text(bytes32,string)`.
  Text { node: B256, key: String },
  /// `contenthash(bytes32)`.
  Contenthash { node: B256 },
  /// `pubkey(bytes32)`: a fixed 64-byte X,Y pair.
  Pubkey { node: B256 },
  /// `name(bytes32)`: the primary-name record.
  Name { node: B256 },
}

impl ProfileCall {
  pub fn decode(calldata: &[u8]) -> Result<Self, Error> {
    let selector: [u8; 4] = calldata
      .get(..4)
      .ok_or(Error::UnsupportedProfile([0; 4]))?
      .try_into()
      .unwrap();

    match selector {
      addr_0Call::SELECTOR => {
        let call = addr_0Call::abi_decode(calldata)?;
        Ok(Self::AddrLegacy { node: call.node })
      }
      addr_1Call::SELECTOR => {
        let call = addr_1Call::abi_decode(calldata)?;
        Ok(Self::Addr {
          node: call.node,
          coin_type: CoinType(call.coinType),
        })
      }
      textCall::SELECTOR => {
        let call = textCall::abi_decode(calldata)?;
        Ok(Self::Text {
          node: call.node,
          key: call.key,
        })
      }
      contenthashCall::SELECTOR => {
        let call = contenthashCall::abi_decode(calldata)?;
        Ok(Self::Contenthash { node: call.node })
      }
      pubkeyCall::SELECTOR => {
        let call = pubkeyCall::abi_decode(calldata)?;
        Ok(Self::Pubkey { node: call.node })
      }
      nameCall::SELECTOR => {
        let call = nameCall::abi_decode(calldata)?;
        Ok(Self::Name { node: call.node })
      }
      selector => Err(Error::UnsupportedProfile(selector)),
    }
  }

  /// Encodes this profile call back to calldata.
  pub fn calldata(&self) -> Vec<u8> {
    match self {
      Self::AddrLegacy { node } => addr_0Call { node: *node }.abi_encode(),
      Self::Addr { node, coin_type } => addr_1Call {
        node: *node,
        coinType: coin_type.0,
      }
      .abi_encode(),
      Self::Text { node, key } => textCall {
        node: *node,
        key: key.clone(),
      }
      .abi_encode(),
      Self::Contenthash { node } => contenthashCall { node: *node }.abi_encode(),
      Self::Pubkey { node } => pubkeyCall { node: *node }.abi_encode(),
      Self::Name { node } => nameCall { node: *node }.abi_encode(),
    }
  }

  /// Wraps individual calls into `multicall` calldata.
  pub fn multicall(calls: &[Vec<u8>]) -> Vec<u8> {
    multicallCall {
      data: calls
        .iter()
        .map(|call| alloy_primitives::Bytes::copy_from_slice(call))
        .collect(),
    }
    .abi_encode()
  }

  pub fn node(&self) -> B256 {
    match self {
      Self::AddrLegacy { node }
      | Self::Addr { node, .. }
      | Self::Text { node, .. }
      | Self::Contenthash { node }
      | Self::Pubkey { node }
      | Self::Name { node } => *node,
    }
  }

  /// Encodes the raw record bytes the gateway read into this profile's
  /// ABI-level return value.
  pub fn encode_answer(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
    match self {
      Self::AddrLegacy { .. } => Ok(coerce_address(raw)?.abi_encode()),
      Self::Addr { .. } | Self::Contenthash { .. } => Ok(raw.to_vec().abi_encode()),
      Self::Text { .. } | Self::Name { .. } => Ok(raw.to_vec().abi_encode()),
      Self::Pubkey { .. } => {
        if raw.is_empty() {
          return Ok((B256::ZERO, B256::ZERO).abi_encode());
        }
        if raw.len() != 64 {
          return Err(Error::DataLength {
            expected: 64,
            actual: raw.len(),
          });
        }
        let x = B256::from_slice(&raw[..32]);
        let y = B256::from_slice(&raw[32..]);
        Ok((x, y).abi_encode())
      }
    }
  }
}

/// Coerces a stored address record to a 20-byte address. Empty reads as
/// the zero address.
fn coerce_address(raw: &[u8]) -> Result<Address, Error> {
  match raw.len() {
    0 => Ok(Address::ZERO),
    20 => Ok(Address::from_slice(raw)),
    actual => Err(Error::DataLength {
      expected: 20,
      actual,
    }),
  }
}

/// The original call shape of a resolution request: one profile call, or a
/// decoded multicall batch. The shape decides aggregate-failure semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverCalls {
  Single(Vec<u8>),
  Batch(Vec<Vec<u8>>),
}

impl ResolverCalls {
  pub fn decode(calldata: &[u8]) -> Self {
    if calldata.get(..4) == Some(&multicallCall::SELECTOR)
      && let Ok(call) = multicallCall::abi_decode(calldata)
    {
      return Self::Batch(call.data.into_iter().map(|data| data.to_vec()).collect());
    }
    Self::Single(calldata.to_vec())
  }

  /// Individual calls in original order, batch or not.
  pub fn calls(&self) -> &[Vec<u8>] {
    match self {
      Self::Single(call) => std::slice::from_ref(call),
      Self::Batch(calls) => calls,
    }
  }

  pub fn is_batch(&self) -> bool {
    matches!(self, Self::Batch(_))
  }

  /// Re-encodes per-call answers. For a batch, the answers are wrapped
  /// back into the `multicall` return shape; for a single call, the lone
  /// answer passes through.
  pub fn encode_answers(&self, mut answers: Vec<Vec<u8>>) -> Vec<u8> {
    match self {
      Self::Single(_) => answers.remove(0),
      Self::Batch(_) => answers
        .into_iter()
        .map(alloy_primitives::Bytes::from)
        .collect::<Vec<alloy_primitives::Bytes>>()
        .abi_encode(),
    }
  }
}

/// Encodes a per-call failure as a standard `Error(string)` revert
/// payload, the in-band error form of a multicall answer slot.
pub fn encode_error(message: &str) -> Vec<u8> {
  use alloy_sol_types::SolError;
  alloy_sol_types::Revert {
    reason: message.into(),
  }
  .abi_encode()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("abi decoding failed: {0}")]
  Abi(String),
  #[error("record data is {actual} bytes, expected {expected}")]
  DataLength { expected: usize, actual: usize },
  #[error("unsupported resolver profile {}", hex::encode(.0))]
  UnsupportedProfile([u8; 4]),
}

impl From<alloy_sol_types::Error> for Error {
  fn from(error: alloy_sol_types::Error) -> Self {
    Self::Abi(error.to_string())
  }
}
