use {
  super::*,
  crate::resolver::{RegistryStore, ResolverConfig},
  alloy_sol_types::SolValue,
};

#[derive(Debug, Parser)]
pub struct ResolveCommand {
  #[arg(
    required_unless_present = "reverse",
    help = "Name to resolve, e.g. `vitalik.eth`."
  )]
  name: Option<Name>,
  #[arg(
    long,
    conflicts_with = "name",
    help = "Reverse-resolve the primary name claimed by <REVERSE>."
  )]
  reverse: Option<Address>,
  #[arg(long, help = "Resolve the address record for SLIP-44 coin type <COIN>.")]
  coin: Option<CoinType>,
  #[arg(long, help = "Resolve the text record for <KEY>.")]
  text: Option<String>,
  #[arg(long, help = "Resolve the content hash record.")]
  contenthash: bool,
  #[arg(long, help = "Resolve the public key record.")]
  pubkey: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Output {
  pub name: String,
  pub answer: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ReverseOutput {
  pub address: Address,
  pub name: String,
}

/// The CLI has no local chain to read, so every lookup routes through
/// the remote tiers.
struct NoLocalState;

impl RegistryStore for NoLocalState {
  fn entry(&self, _registry: Address, _canonical: B256) -> Option<RegistryEntry> {
    None
  }
}

impl resolver::DnssecOracle for NoLocalState {
  /// The gateway driver verifies RR-set signatures server-side and
  /// returns the verified answer as the proof blob.
  fn verify(&self, proof: &[u8]) -> Result<Vec<u8>, ResolveError> {
    Ok(proof.to_vec())
  }
}

impl resolver::DelegateDirectory for NoLocalState {
  fn kind(&self, _resolver: Address) -> resolver::DelegateKind {
    resolver::DelegateKind::Extended
  }

  fn call(
    &self,
    resolver: Address,
    _name: &Name,
    _calldata: &[u8],
    _context: Option<&[u8]>,
  ) -> Result<Vec<u8>, ResolveError> {
    Err(ResolveError::Delegate(format!(
      "cannot call on-chain delegate {resolver} without an rpc endpoint"
    )))
  }
}

impl ResolveCommand {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let config: ResolverConfig = settings.resolver_config()?;

    let state = NoLocalState;
    let resolver = resolver::Resolver {
      config: &config,
      registry: &state,
      legacy_registrar: None,
      legacy_resolver: None,
      oracle: &state,
      delegates: &state,
      now: settings.now(),
    };

    let client = Client::new(settings.gateway_urls.clone());

    if let Some(address) = self.reverse {
      let answer = resolver
        .reverse_resolve(&client, address)
        .with_context(|| format!("failed to reverse-resolve `{address}`"))?;

      let name = String::abi_decode(&answer)
        .context("reverse resolver returned a malformed name record")?;

      return print_json(ReverseOutput { address, name });
    }

    let name = self
      .name
      .ok_or_else(|| anyhow!("<NAME> is required unless --reverse is given"))?;

    let node = name.node();
    let profile = if let Some(key) = self.text {
      ProfileCall::Text { node, key }
    } else if self.contenthash {
      ProfileCall::Contenthash { node }
    } else if self.pubkey {
      ProfileCall::Pubkey { node }
    } else if let Some(coin_type) = self.coin {
      ProfileCall::Addr { node, coin_type }
    } else {
      ProfileCall::AddrLegacy { node }
    };

    let answer = resolver
      .resolve(&client, name.clone(), &profile.calldata())
      .with_context(|| format!("failed to resolve `{name}`"))?;

    print_json(Output {
      name: name.to_string(),
      answer: format!("0x{}", hex::encode(answer)),
    })
  }
}
