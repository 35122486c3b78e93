//! Wire-format types for ENSv2: DNS-encoded names, the TXT delegation
//! grammar, gateway request programs, registry entry storage layout, and
//! resolver profile calldata.

use {
  alloy_primitives::{keccak256, Address, B256, U256},
  serde::{Deserialize, Serialize},
  serde_with::{DeserializeFromStr, SerializeDisplay},
  std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
  },
  thiserror::Error,
};

pub use {
  ens1::{Context, DelegateSpec, Ens1Record},
  entry::{canonical_id, external_id, RegistryEntry},
  name::Name,
  profile::{CoinType, ProfileCall, ResolverCalls},
  program::{GatewayRequest, GatewayResponse, Op},
  rdata::{Record, RecordIter},
};

pub mod ens1;
pub mod entry;
pub mod name;
pub mod profile;
pub mod program;
pub mod rdata;
pub mod txt;
