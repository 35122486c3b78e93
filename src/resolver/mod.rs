use super::*;

mod alias;
mod dns;
mod traversal;

pub use traversal::{
  OUTPUT_DEFAULT_ADDRESS, OUTPUT_PROFILE_BASE, OUTPUT_REGISTRY, OUTPUT_RESOLVER,
};

/// Local registry reads: entries for names already ejected to this chain.
pub trait RegistryStore {
  fn entry(&self, registry: Address, canonical: B256) -> Option<RegistryEntry>;
}

/// The V1 registrar, consulted to decide whether a second-level name is
/// still actively registered under the legacy system.
pub trait LegacyRegistrar {
  fn expiry(&self, label_hash: B256) -> u64;
  fn owner(&self, label_hash: B256) -> Address;
}

/// The V1 extended-resolution interface.
pub trait LegacyResolver {
  fn resolve(&self, name: &Name, calldata: &[u8]) -> Result<Vec<u8>, ResolveError>;
}

/// Verifies a signed RR set, returning the raw DNS answer bytes. A
/// trusted oracle: anything it returns is taken as authentic.
pub trait DnssecOracle {
  fn verify(&self, proof: &[u8]) -> Result<Vec<u8>, ResolveError>;
}

/// How a delegate resolver can be called. Capability probing is a fixed
/// negotiation step, not live interface discovery.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DelegateKind {
  /// `resolve(name, calldata)`; the context is not forwarded.
  Extended,
  /// `resolve(name, calldata, context)`, DNS-style three-argument form.
  DnsContext,
  /// Interpreted in-process: the context rewrites or replaces the name
  /// and resolution recurses.
  Alias,
  /// Interpreted in-process: the context names a remote registry and an
  /// already-consumed suffix; traversal continues from there.
  RegistryContinuation,
}

/// Calls out to delegate resolvers found via local storage or ENS1
/// records.
pub trait DelegateDirectory {
  fn kind(&self, resolver: Address) -> DelegateKind;

  fn call(
    &self,
    resolver: Address,
    name: &Name,
    calldata: &[u8],
    context: Option<&[u8]>,
  ) -> Result<Vec<u8>, ResolveError>;
}

/// The off-chain fetch boundary a driver must provide to pump the state
/// machine to completion.
pub trait Fetcher {
  fn fetch(&self, request: &GatewayRequest) -> Result<GatewayResponse, ResolveError>;

  /// Performs the off-chain DNSSEC lookup for TXT records at `name`,
  /// returning the signed proof blob for the oracle to verify.
  fn dns_query(&self, name: &Name) -> Result<Vec<u8>, ResolveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
  #[error("multicall batch of {0} calls exceeds one traversal request")]
  BatchTooLarge(usize),
  #[error("gateway fetch failed: {0}")]
  Gateway(String),
  #[error("delegate call failed: {0}")]
  Delegate(String),
  #[error("name has too many labels for one traversal request")]
  NameTooLong,
  #[error("DNSSEC verification failed: {0}")]
  Oracle(String),
  #[error(transparent)]
  Profile(#[from] profile::Error),
  #[error("invalid DNS record data: {0}")]
  Rdata(#[from] enswire::rdata::Error),
  #[error("name {0} is unreachable")]
  UnreachableName(Name),
}

/// Which tier answered (or is answering) a resolution.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
  Local,
  Legacy,
  Remote,
  Dns,
}

/// The per-request multicall bundle, threaded through suspension points
/// and destroyed when the final answer is produced.
pub struct Resolution {
  /// The name currently being resolved (aliases may have rewritten it).
  pub name: Name,
  /// The name the caller asked about, carried for diagnostics.
  pub original: Name,
  pub tier: Tier,
  calldata: Vec<u8>,
  calls: ResolverCalls,
  profiles: Vec<Result<ProfileCall, profile::Error>>,
  depth: u8,
}

/// The state machine's externally visible states. Suspension points
/// return the request to perform plus the closure state to re-enter
/// with; there is no error-channel control flow.
pub enum Outcome {
  Done(Vec<u8>),
  NeedsFetch(GatewayRequest, Resolution),
  NeedsDns(Name, Resolution),
  Unreachable(Name),
}

/// Static configuration for one resolver instance. Updates are the
/// owner's problem; the orchestrator only ever reads it.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
  /// Root of the locally-known registry hierarchy.
  pub root_registry: Address,
  /// The remote (cross-chain) registry owning the `eth` TLD.
  pub eth_registry: Address,
  /// Names under this suffix resolve via the remote chain.
  pub eth_suffix: Name,
  /// Legacy registrations owned by this sentinel count as inactive.
  pub burn_address: Address,
}

pub struct Resolver<'a> {
  pub config: &'a ResolverConfig,
  pub registry: &'a dyn RegistryStore,
  pub legacy_registrar: Option<&'a dyn LegacyRegistrar>,
  pub legacy_resolver: Option<&'a dyn LegacyResolver>,
  pub oracle: &'a dyn DnssecOracle,
  pub delegates: &'a dyn DelegateDirectory,
  pub now: u64,
}

const MAX_ALIAS_DEPTH: u8 = 8;

impl Resolver<'_> {
  /// Entry point: route the request to a tier and either answer it
  /// synchronously or suspend on an off-chain fetch.
  pub fn begin(&self, name: Name, calldata: &[u8]) -> Result<Outcome, ResolveError> {
    let state = Resolution::new(name, calldata);
    self.route(state)
  }

  fn route(&self, mut state: Resolution) -> Result<Outcome, ResolveError> {
    // tier 1: a locally ejected ancestor with a concrete resolver
    if let Some(resolver) = self.local_resolver(&state.name) {
      log::debug!("{}: local resolver {resolver}", state.name);
      state.tier = Tier::Local;
      return self.dispatch_delegate(resolver, None, state);
    }

    if state.name.ends_with(&self.config.eth_suffix) && !state.name.is_root() {
      // tier 2: still actively registered under the V1 system
      if self.legacy_active(&state.name) {
        log::debug!("{}: legacy registration active", state.name);
        state.tier = Tier::Legacy;
        let resolver = self
          .legacy_resolver
          .ok_or_else(|| ResolveError::Delegate("no legacy resolver configured".into()))?;
        return Ok(Outcome::Done(resolver.resolve(&state.name, &state.calldata)?));
      }

      // tier 3: remote traversal, proven off-chain
      state.tier = Tier::Remote;
      return self.remote_traversal(self.config.eth_registry, &self.config.eth_suffix, state);
    }

    // DNS fallback for names outside the remote hierarchy
    state.tier = Tier::Dns;
    Ok(Outcome::NeedsDns(state.name.clone(), state))
  }

  /// Re-entry after a gateway fetch. `response` has already been proven
  /// by the external verifier.
  pub fn gateway_callback(
    &self,
    state: Resolution,
    response: &GatewayResponse,
  ) -> Result<Outcome, ResolveError> {
    traversal::interpret(self, state, response)
  }

  /// Re-entry after an off-chain DNSSEC lookup. `proof` is the signed RR
  /// set, still to be verified by the oracle.
  pub fn dns_callback(&self, state: Resolution, proof: &[u8]) -> Result<Outcome, ResolveError> {
    dns::callback(self, state, proof)
  }

  /// Pumps the state machine to completion using `fetcher` for the
  /// off-chain legs.
  pub fn resolve(
    &self,
    fetcher: &dyn Fetcher,
    name: Name,
    calldata: &[u8],
  ) -> Result<Vec<u8>, ResolveError> {
    let mut outcome = self.begin(name, calldata)?;
    loop {
      outcome = match outcome {
        Outcome::Done(answer) => return Ok(answer),
        Outcome::Unreachable(name) => return Err(ResolveError::UnreachableName(name)),
        Outcome::NeedsFetch(request, state) => {
          let response = fetcher.fetch(&request)?;
          self.gateway_callback(state, &response)?
        }
        Outcome::NeedsDns(name, state) => {
          let proof = fetcher.dns_query(&name)?;
          self.dns_callback(state, &proof)?
        }
      };
    }
  }

  /// Walks the local hierarchy root-to-leaf. Expired entries read as
  /// absent; a hop without a resolver does not clear a previously found
  /// one.
  fn local_resolver(&self, name: &Name) -> Option<Address> {
    let mut labels = name.labels().collect::<Vec<&[u8]>>();
    labels.reverse();

    let mut registry = self.config.root_registry;
    let mut resolver = None;

    for label in labels {
      let Some(entry) = self
        .registry
        .entry(registry, canonical_id(keccak256(label)))
      else {
        break;
      };
      let Some(entry) = entry.live(self.now) else {
        break;
      };
      if !entry.resolver.is_zero() {
        resolver = Some(entry.resolver);
      }
      if entry.subregistry.is_zero() {
        break;
      }
      registry = entry.subregistry;
    }

    resolver
  }

  /// True when the name's second-level label is still actively registered
  /// under the V1 registrar. Ownership by the burn sentinel counts as
  /// inactive.
  fn legacy_active(&self, name: &Name) -> bool {
    let Some(registrar) = self.legacy_registrar else {
      return false;
    };

    let suffix_labels = self.config.eth_suffix.label_count();
    let labels = name.labels().collect::<Vec<&[u8]>>();

    let Some(second_level) = labels.len().checked_sub(suffix_labels + 1) else {
      return false;
    };
    let label_hash = keccak256(labels[second_level]);

    if registrar.expiry(label_hash) <= self.now {
      return false;
    }

    let owner = registrar.owner(label_hash);
    !owner.is_zero() && owner != self.config.burn_address
  }

  fn remote_traversal(
    &self,
    registry: Address,
    consumed_suffix: &Name,
    state: Resolution,
  ) -> Result<Outcome, ResolveError> {
    match traversal::build(registry, consumed_suffix, &state)? {
      Some(request) => Ok(Outcome::NeedsFetch(request, state)),
      // every profile failed validation before any fetch was needed
      None => traversal::aggregate_failure(&state),
    }
  }

  fn dispatch_delegate(
    &self,
    resolver: Address,
    context: Option<&[u8]>,
    state: Resolution,
  ) -> Result<Outcome, ResolveError> {
    match self.delegates.kind(resolver) {
      DelegateKind::Extended => Ok(Outcome::Done(self.delegates.call(
        resolver,
        &state.name,
        &state.calldata,
        None,
      )?)),
      DelegateKind::DnsContext => Ok(Outcome::Done(self.delegates.call(
        resolver,
        &state.name,
        &state.calldata,
        context,
      )?)),
      DelegateKind::Alias => alias::resolve(self, context.unwrap_or_default(), state),
      DelegateKind::RegistryContinuation => {
        alias::continue_from_registry(self, context.unwrap_or_default(), state)
      }
    }
  }

  fn recurse(&self, mut state: Resolution, name: Name) -> Result<Outcome, ResolveError> {
    if state.depth >= MAX_ALIAS_DEPTH {
      return Ok(Outcome::Unreachable(state.original.clone()));
    }
    state.depth += 1;
    state.name = name;
    self.route(state)
  }

  /// Resolves the primary name claimed by `address`: queries the
  /// `name(bytes32)` record at the reverse name, routed through the same
  /// tiers as any other lookup. The answer is the ABI-encoded name string.
  pub fn reverse_resolve(
    &self,
    fetcher: &dyn Fetcher,
    address: Address,
  ) -> Result<Vec<u8>, ResolveError> {
    let name = reverse_name(address);
    let calldata = ProfileCall::Name { node: name.node() }.calldata();
    self.resolve(fetcher, name, &calldata)
  }
}

/// The reverse node for an address: `<lowercase-hex-address>.addr.reverse`.
pub fn reverse_name(address: Address) -> Name {
  Name::from_labels([hex::encode(address), "addr".into(), "reverse".into()])
    .expect("hex labels are well-formed")
}

impl Resolution {
  fn new(name: Name, calldata: &[u8]) -> Self {
    let calls = ResolverCalls::decode(calldata);
    let profiles = calls
      .calls()
      .iter()
      .map(|call| ProfileCall::decode(call))
      .collect();

    Self {
      original: name.clone(),
      name,
      tier: Tier::Local,
      calldata: calldata.to_vec(),
      calls,
      profiles,
      depth: 0,
    }
  }

  pub fn is_batch(&self) -> bool {
    self.calls.is_batch()
  }
}

#[cfg(test)]
mod tests;
