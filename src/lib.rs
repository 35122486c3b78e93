//! ENSv2 cross-chain name resolution: tier routing, the gateway-request
//! traversal, DNSSEC TXT fallback, and ENS1 delegation.

use {
  alloy_primitives::{keccak256, Address, B256, U256},
  anyhow::{anyhow, Context},
  clap::Parser,
  enswire::{
    entry::{canonical_id, RegistryEntry},
    profile::{self, CoinType, ProfileCall, ResolverCalls},
    program::{GatewayRequest, GatewayResponse},
    Name,
  },
  serde::{Deserialize, Serialize},
  std::{fs, path::PathBuf},
};

pub use {
  gateway::Client,
  options::Options,
  resolver::{
    DelegateDirectory, DelegateKind, DnssecOracle, Fetcher, LegacyRegistrar, LegacyResolver,
    Outcome, Resolution, ResolveError, Resolver, Tier,
  },
  settings::Settings,
  subcommand::Subcommand,
};

pub mod gateway;
pub mod options;
pub mod resolver;
pub mod settings;
pub mod subcommand;

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

/// The sentinel owner address that counts as "not registered" when
/// checking legacy (V1) registrations.
pub fn burn_address() -> Address {
  "0x000000000000000000000000000000000000dEaD"
    .parse()
    .unwrap()
}

#[derive(Parser)]
#[command(version, about = "ENSv2 cross-chain name resolver")]
pub struct Arguments {
  #[command(flatten)]
  pub options: Options,
  #[command(subcommand)]
  pub subcommand: Subcommand,
}

impl Arguments {
  pub fn run(self) -> Result {
    let Self {
      options,
      subcommand,
    } = self;
    let settings = Settings::load(options)?;
    subcommand.run(settings)
  }
}
