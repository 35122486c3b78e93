use {
  super::*,
  alloy_sol_types::SolValue,
  enswire::rdata::{CLASS_IN, TYPE_TXT},
  mockgateway::Chain,
  pretty_assertions::assert_eq,
  std::collections::HashMap,
};

const NOW: u64 = 1_700_000_000;
const LATER: u64 = NOW + 1_000_000;

fn address(byte: u8) -> Address {
  Address::repeat_byte(byte)
}

fn config() -> ResolverConfig {
  ResolverConfig {
    root_registry: address(0x01),
    eth_registry: address(0x02),
    eth_suffix: "eth".parse().unwrap(),
    burn_address: burn_address(),
  }
}

#[derive(Default)]
struct Env {
  entries: HashMap<(Address, B256), RegistryEntry>,
  legacy_expiries: HashMap<B256, u64>,
  legacy_owners: HashMap<B256, Address>,
  legacy_answer: Option<Vec<u8>>,
  kinds: HashMap<Address, DelegateKind>,
  answers: HashMap<Address, Vec<u8>>,
}

impl Env {
  fn eject(&mut self, registry: Address, label: &str, entry: RegistryEntry) {
    self
      .entries
      .insert((registry, canonical_id(keccak256(label))), entry);
  }

  fn legacy(&mut self, label: &str, owner: Address, expiry: u64) {
    self.legacy_expiries.insert(keccak256(label), expiry);
    self.legacy_owners.insert(keccak256(label), owner);
  }

  fn delegate(&mut self, resolver: Address, kind: DelegateKind, answer: &[u8]) {
    self.kinds.insert(resolver, kind);
    self.answers.insert(resolver, answer.to_vec());
  }
}

impl RegistryStore for Env {
  fn entry(&self, registry: Address, canonical: B256) -> Option<RegistryEntry> {
    self.entries.get(&(registry, canonical)).copied()
  }
}

impl LegacyRegistrar for Env {
  fn expiry(&self, label_hash: B256) -> u64 {
    self.legacy_expiries.get(&label_hash).copied().unwrap_or(0)
  }

  fn owner(&self, label_hash: B256) -> Address {
    self
      .legacy_owners
      .get(&label_hash)
      .copied()
      .unwrap_or(Address::ZERO)
  }
}

impl LegacyResolver for Env {
  fn resolve(&self, _name: &Name, _calldata: &[u8]) -> Result<Vec<u8>, ResolveError> {
    self
      .legacy_answer
      .clone()
      .ok_or_else(|| ResolveError::Delegate("no legacy answer".into()))
  }
}

impl DnssecOracle for Env {
  fn verify(&self, proof: &[u8]) -> Result<Vec<u8>, ResolveError> {
    Ok(proof.to_vec())
  }
}

impl DelegateDirectory for Env {
  fn kind(&self, resolver: Address) -> DelegateKind {
    self
      .kinds
      .get(&resolver)
      .copied()
      .unwrap_or(DelegateKind::Extended)
  }

  fn call(
    &self,
    resolver: Address,
    _name: &Name,
    _calldata: &[u8],
    context: Option<&[u8]>,
  ) -> Result<Vec<u8>, ResolveError> {
    let mut answer = self
      .answers
      .get(&resolver)
      .cloned()
      .ok_or_else(|| ResolveError::Delegate(format!("no answer for {resolver}")))?;
    if let Some(context) = context {
      answer.extend_from_slice(context);
    }
    Ok(answer)
  }
}

struct Gateway {
  chain: Chain,
  dns_proof: Vec<u8>,
}

impl Fetcher for Gateway {
  fn fetch(&self, request: &GatewayRequest) -> Result<GatewayResponse, ResolveError> {
    mockgateway::execute(request, &self.chain)
      .map_err(|error| ResolveError::Gateway(error.to_string()))
  }

  fn dns_query(&self, _name: &Name) -> Result<Vec<u8>, ResolveError> {
    Ok(self.dns_proof.clone())
  }
}

struct Setup {
  env: Env,
  gateway: Gateway,
}

impl Setup {
  fn new() -> Self {
    Self {
      env: Env::default(),
      gateway: Gateway {
        chain: mockgateway::builder().now(NOW).build(),
        dns_proof: Vec::new(),
      },
    }
  }

  fn resolver<'a>(&'a self, config: &'a ResolverConfig) -> Resolver<'a> {
    Resolver {
      config,
      registry: &self.env,
      legacy_registrar: Some(&self.env),
      legacy_resolver: Some(&self.env),
      oracle: &self.env,
      delegates: &self.env,
      now: NOW,
    }
  }

  fn resolve(&self, config: &ResolverConfig, name: &str, calldata: &[u8]) -> Result<Vec<u8>, ResolveError> {
    self
      .resolver(config)
      .resolve(&self.gateway, name.parse().unwrap(), calldata)
  }
}

fn entry(subregistry: Address, resolver: Address, expiry: u64) -> RegistryEntry {
  RegistryEntry {
    subregistry,
    resolver,
    expiry,
    token_version: 0,
    acl_epoch: 0,
  }
}

fn addr_call(name: &str) -> Vec<u8> {
  ProfileCall::AddrLegacy {
    node: name.parse::<Name>().unwrap().node(),
  }
  .calldata()
}

fn txt_record(owner: &str, value: &[u8]) -> Vec<u8> {
  let mut wire = owner.parse::<Name>().unwrap().into_wire();
  wire.extend_from_slice(&TYPE_TXT.to_be_bytes());
  wire.extend_from_slice(&CLASS_IN.to_be_bytes());
  wire.extend_from_slice(&300u32.to_be_bytes());
  let rdata_len = u16::try_from(value.len() + 1).unwrap();
  wire.extend_from_slice(&rdata_len.to_be_bytes());
  wire.push(u8::try_from(value.len()).unwrap());
  wire.extend_from_slice(value);
  wire
}

/// Registers a three-hop chain `foo.bar.baz.eth` on the remote registry.
/// Only `baz` and `foo` carry resolvers.
fn three_hops(setup: &mut Setup, config: &ResolverConfig) -> (Address, Address) {
  let baz_registry = address(0x10);
  let bar_registry = address(0x11);
  let baz_resolver = address(0xa1);
  let foo_resolver = address(0xa3);

  let chain = &mut setup.gateway.chain;
  chain.register(
    config.eth_registry,
    "baz",
    entry(baz_registry, baz_resolver, LATER),
  );
  chain.register(baz_registry, "bar", entry(bar_registry, Address::ZERO, LATER));
  chain.register(bar_registry, "foo", entry(Address::ZERO, foo_resolver, LATER));

  (baz_resolver, foo_resolver)
}

#[test]
fn last_nonzero_resolver_wins() {
  let config = config();
  let mut setup = Setup::new();
  let (baz_resolver, foo_resolver) = three_hops(&mut setup, &config);

  let name = "foo.bar.baz.eth";
  let node = name.parse::<Name>().unwrap().node();
  let winner = address(0xee);
  let loser = address(0xdd);

  let chain = &mut setup.gateway.chain;
  chain.set_addr(
    foo_resolver,
    node,
    CoinType(U256::from(CoinType::ETH)),
    winner.as_slice(),
  );
  chain.set_addr(
    baz_resolver,
    node,
    CoinType(U256::from(CoinType::ETH)),
    loser.as_slice(),
  );

  let answer = setup.resolve(&config, name, &addr_call(name)).unwrap();
  assert_eq!(answer, winner.abi_encode());
}

#[test]
fn wildcard_falls_back_to_ancestor_resolver() {
  let config = config();
  let mut setup = Setup::new();
  let (baz_resolver, _) = three_hops(&mut setup, &config);

  // `quux.bar.baz.eth` has no entry of its own: the walk stops at the
  // missing hop and baz's resolver answers
  let name = "quux.bar.baz.eth";
  let node = name.parse::<Name>().unwrap().node();
  let wildcard = address(0xcc);

  setup.gateway.chain.set_addr(
    baz_resolver,
    node,
    CoinType(U256::from(CoinType::ETH)),
    wildcard.as_slice(),
  );

  let answer = setup.resolve(&config, name, &addr_call(name)).unwrap();
  assert_eq!(answer, wildcard.abi_encode());
}

#[test]
fn expiry_boundary_is_exclusive() {
  let config = config();
  let mut setup = Setup::new();

  let sub_registry = address(0x10);
  let parent_resolver = address(0xa1);
  let child_resolver = address(0xa2);

  let expired_name = "kid.gone.eth";
  let live_name = "kid.kept.eth";

  {
    let chain = &mut setup.gateway.chain;
    // expiry == now: the hop must abort and the name is unreachable
    chain.register(
      config.eth_registry,
      "gone",
      entry(sub_registry, Address::ZERO, NOW),
    );
    // expiry == now + 1: still live
    chain.register(
      config.eth_registry,
      "kept",
      entry(sub_registry, parent_resolver, NOW + 1),
    );
    chain.register(sub_registry, "kid", entry(Address::ZERO, child_resolver, LATER));

    chain.set_addr(
      child_resolver,
      live_name.parse::<Name>().unwrap().node(),
      CoinType(U256::from(CoinType::ETH)),
      address(0xbb).as_slice(),
    );
  }

  assert!(matches!(
    setup.resolve(&config, expired_name, &addr_call(expired_name)),
    Err(ResolveError::UnreachableName(name)) if name.to_string() == expired_name
  ));

  let answer = setup.resolve(&config, live_name, &addr_call(live_name)).unwrap();
  assert_eq!(answer, address(0xbb).abi_encode());
}

#[test]
fn no_resolver_is_unreachable() {
  let config = config();
  let mut setup = Setup::new();

  setup.gateway.chain.register(
    config.eth_registry,
    "bare",
    entry(Address::ZERO, Address::ZERO, LATER),
  );

  assert!(matches!(
    setup.resolve(&config, "bare.eth", &addr_call("bare.eth")),
    Err(ResolveError::UnreachableName(_))
  ));
}

#[test]
fn default_address_substitution_is_evm_only() {
  let config = config();
  let mut setup = Setup::new();

  let resolver = address(0xa1);
  let name = "base.eth";
  let node = name.parse::<Name>().unwrap().node();
  let default = address(0x99);

  {
    let chain = &mut setup.gateway.chain;
    chain.register(config.eth_registry, "base", entry(Address::ZERO, resolver, LATER));
    chain.set_addr(resolver, node, CoinType::evm(0), default.as_slice());
  }

  // EVM-flavored coin type with no specific record: default applies
  let evm_call = ProfileCall::Addr {
    node,
    coin_type: CoinType::evm(8453),
  }
  .calldata();
  let answer = setup.resolve(&config, name, &evm_call).unwrap();
  assert_eq!(answer, default.as_slice().to_vec().abi_encode());

  // non-EVM coin type: empty, never the default
  let doge_call = ProfileCall::Addr {
    node,
    coin_type: CoinType(U256::from(3u64)),
  }
  .calldata();
  let answer = setup.resolve(&config, name, &doge_call).unwrap();
  assert_eq!(answer, Vec::<u8>::new().abi_encode());
}

#[test]
fn text_and_contenthash_records() {
  let config = config();
  let mut setup = Setup::new();

  let resolver = address(0xa1);
  let name = "records.eth";
  let node = name.parse::<Name>().unwrap().node();

  {
    let chain = &mut setup.gateway.chain;
    chain.register(
      config.eth_registry,
      "records",
      entry(Address::ZERO, resolver, LATER),
    );
    chain.set_text(resolver, node, "avatar", "ipfs://avatar");
    chain.set_contenthash(resolver, node, &[0xe3, 0x01, 0x01]);
  }

  let text_call = ProfileCall::Text {
    node,
    key: "avatar".into(),
  }
  .calldata();
  let answer = setup.resolve(&config, name, &text_call).unwrap();
  assert_eq!(answer, b"ipfs://avatar".to_vec().abi_encode());

  let hash_call = ProfileCall::Contenthash { node }.calldata();
  let answer = setup.resolve(&config, name, &hash_call).unwrap();
  assert_eq!(answer, vec![0xe3u8, 0x01, 0x01].abi_encode());
}

#[test]
fn multicall_aggregate_failure_semantics() {
  let config = config();
  let mut setup = Setup::new();

  setup.gateway.chain.register(
    config.eth_registry,
    "batchy",
    entry(Address::ZERO, address(0xa1), LATER),
  );

  let unsupported = vec![0xde, 0xad, 0xbe, 0xef];

  // batch form: an array of per-call encoded errors, no hard failure
  let batch = ProfileCall::multicall(&[unsupported.clone(), unsupported.clone()]);
  let answer = setup.resolve(&config, "batchy.eth", &batch).unwrap();
  let results = Vec::<alloy_primitives::Bytes>::abi_decode(&answer).unwrap();
  assert_eq!(results.len(), 2);
  for result in results {
    assert_eq!(&result[..4], profile::encode_error("").get(..4).unwrap());
  }

  // single form: the error is re-raised verbatim
  assert!(matches!(
    setup.resolve(&config, "batchy.eth", &unsupported),
    Err(ResolveError::Profile(profile::Error::UnsupportedProfile(
      [0xde, 0xad, 0xbe, 0xef]
    )))
  ));
}

#[test]
fn multicall_mixes_successes_and_failures() {
  let config = config();
  let mut setup = Setup::new();

  let resolver = address(0xa1);
  let name = "mixed.eth";
  let node = name.parse::<Name>().unwrap().node();
  let owner = address(0x77);

  {
    let chain = &mut setup.gateway.chain;
    chain.register(config.eth_registry, "mixed", entry(Address::ZERO, resolver, LATER));
    chain.set_addr(
      resolver,
      node,
      CoinType(U256::from(CoinType::ETH)),
      owner.as_slice(),
    );
  }

  let batch = ProfileCall::multicall(&[
    ProfileCall::AddrLegacy { node }.calldata(),
    vec![0xde, 0xad, 0xbe, 0xef],
  ]);

  let answer = setup.resolve(&config, name, &batch).unwrap();
  let results = Vec::<alloy_primitives::Bytes>::abi_decode(&answer).unwrap();
  assert_eq!(results.len(), 2);
  assert_eq!(results[0].to_vec(), owner.abi_encode());
  assert_eq!(&results[1][..4], profile::encode_error("").get(..4).unwrap());
}

#[test]
fn oversized_batches_are_rejected_before_fetch() {
  let config = config();
  let mut setup = Setup::new();

  let node = "big.eth".parse::<Name>().unwrap().node();
  setup.gateway.chain.register(
    config.eth_registry,
    "big",
    entry(Address::ZERO, address(0xa1), LATER),
  );

  let calls = vec![ProfileCall::AddrLegacy { node }.calldata(); 300];
  let batch = ProfileCall::multicall(&calls);

  assert!(matches!(
    setup.resolve(&config, "big.eth", &batch),
    Err(ResolveError::BatchTooLarge(300))
  ));
}

#[test]
fn names_with_too_many_labels_are_rejected() {
  let config = config();
  let setup = Setup::new();

  let name = format!("{}eth", "a.".repeat(300));

  assert!(matches!(
    setup.resolve(&config, &name, &addr_call(&name)),
    Err(ResolveError::NameTooLong)
  ));
}

#[test]
fn active_legacy_registration_routes_to_v1() {
  let config = config();
  let mut setup = Setup::new();

  setup.env.legacy("classic", address(0x55), LATER);
  setup.env.legacy_answer = Some(b"v1 answer".to_vec());

  let answer = setup
    .resolve(&config, "sub.classic.eth", &addr_call("sub.classic.eth"))
    .unwrap();
  assert_eq!(answer, b"v1 answer");
}

#[test]
fn burned_legacy_registration_is_inactive() {
  let config = config();
  let mut setup = Setup::new();

  setup.env.legacy("burned", burn_address(), LATER);
  setup.env.legacy_answer = Some(b"v1 answer".to_vec());

  // ownership by the burn sentinel falls through to the remote tier,
  // which knows nothing about the name
  assert!(matches!(
    setup.resolve(&config, "burned.eth", &addr_call("burned.eth")),
    Err(ResolveError::UnreachableName(_))
  ));
}

#[test]
fn expired_legacy_registration_is_inactive() {
  let config = config();
  let mut setup = Setup::new();

  setup.env.legacy("lapsed", address(0x55), NOW);
  setup.env.legacy_answer = Some(b"v1 answer".to_vec());

  assert!(matches!(
    setup.resolve(&config, "lapsed.eth", &addr_call("lapsed.eth")),
    Err(ResolveError::UnreachableName(_))
  ));
}

#[test]
fn bare_suffix_is_never_legacy() {
  let config = config();
  let mut setup = Setup::new();

  setup.env.legacy("eth", address(0x55), LATER);
  setup.env.legacy_answer = Some(b"v1 answer".to_vec());

  assert!(matches!(
    setup.resolve(&config, "eth", &addr_call("eth")),
    Err(ResolveError::UnreachableName(_))
  ));
}

#[test]
fn reverse_names_use_lowercase_hex() {
  assert_eq!(
    reverse_name(Address::repeat_byte(0xAB)).to_string(),
    format!("{}.addr.reverse", "ab".repeat(20))
  );
}

#[test]
fn reverse_resolution_walks_the_reverse_hierarchy() {
  let config = config();
  let mut setup = Setup::new();

  let holder = address(0x42);
  let reverse_registry = address(0x60);
  let addr_registry = address(0x61);
  let name_resolver = address(0xa7);

  setup.env.eject(
    config.root_registry,
    "reverse",
    entry(reverse_registry, Address::ZERO, LATER),
  );
  setup.env.eject(
    reverse_registry,
    "addr",
    entry(addr_registry, Address::ZERO, LATER),
  );
  setup.env.eject(
    addr_registry,
    &hex::encode(holder),
    entry(Address::ZERO, name_resolver, LATER),
  );
  setup.env.delegate(
    name_resolver,
    DelegateKind::Extended,
    &"holder.eth".to_string().abi_encode(),
  );

  let answer = setup
    .resolver(&config)
    .reverse_resolve(&setup.gateway, holder)
    .unwrap();
  assert_eq!(String::abi_decode(&answer).unwrap(), "holder.eth");
}

#[test]
fn locally_ejected_resolver_answers_synchronously() {
  let config = config();
  let mut setup = Setup::new();

  let eth_local = address(0x20);
  let local_resolver = address(0xaa);

  setup
    .env
    .eject(config.root_registry, "eth", entry(eth_local, Address::ZERO, LATER));
  setup
    .env
    .eject(eth_local, "ejected", entry(Address::ZERO, local_resolver, LATER));
  setup
    .env
    .delegate(local_resolver, DelegateKind::Extended, b"local answer");

  let answer = setup
    .resolve(&config, "ejected.eth", &addr_call("ejected.eth"))
    .unwrap();
  assert_eq!(answer, b"local answer");
}

#[test]
fn dns_delegation_forwards_context_to_dns_delegates() {
  let config = config();
  let mut setup = Setup::new();

  let delegate = address(0xd1);
  setup
    .env
    .delegate(delegate, DelegateKind::DnsContext, b"dns answer:");

  let mut proof = txt_record("example.com", b"unrelated=1");
  proof.extend(txt_record(
    "example.com",
    format!("ENS1 {delegate} some-context").as_bytes(),
  ));

  setup.gateway.dns_proof = proof;

  let answer = setup
    .resolve(&config, "example.com", &addr_call("example.com"))
    .unwrap();
  assert_eq!(answer, b"dns answer:some-context");
}

#[test]
fn dns_delegation_withholds_context_from_extended_delegates() {
  let config = config();
  let mut setup = Setup::new();

  let delegate = address(0xd2);
  setup
    .env
    .delegate(delegate, DelegateKind::Extended, b"plain answer");

  setup.gateway.dns_proof = txt_record(
    "example.com",
    format!("ENS1 {delegate} ignored-context").as_bytes(),
  );

  let answer = setup
    .resolve(&config, "example.com", &addr_call("example.com"))
    .unwrap();
  assert_eq!(answer, b"plain answer");
}

#[test]
fn dns_delegate_by_name_resolves_locally() {
  let config = config();
  let mut setup = Setup::new();

  let named_resolver = address(0xd3);

  // `resolver.example` resolves locally to the delegate
  let example_registry = address(0x30);
  setup.env.eject(
    config.root_registry,
    "example",
    entry(example_registry, Address::ZERO, LATER),
  );
  setup.env.eject(
    example_registry,
    "resolver",
    entry(Address::ZERO, named_resolver, LATER),
  );
  setup
    .env
    .delegate(named_resolver, DelegateKind::Extended, b"named answer");

  // the first record's delegate name does not resolve; scanning continues
  let mut proof = txt_record("web.com", b"ENS1 missing.example");
  proof.extend(txt_record("web.com", b"ENS1 resolver.example"));
  setup.gateway.dns_proof = proof;

  let answer = setup
    .resolve(&config, "web.com", &addr_call("web.com"))
    .unwrap();
  assert_eq!(answer, b"named answer");
}

#[test]
fn no_delegating_record_is_unreachable() {
  let config = config();
  let mut setup = Setup::new();

  setup.gateway.dns_proof = txt_record("web.com", b"v=spf1 -all");

  assert!(matches!(
    setup.resolve(&config, "web.com", &addr_call("web.com")),
    Err(ResolveError::UnreachableName(name)) if name.to_string() == "web.com"
  ));
}

#[test]
fn malformed_txt_chunking_is_a_hard_error() {
  let config = config();
  let mut setup = Setup::new();

  // length prefix overruns the declared record boundary
  let mut record = "web.com".parse::<Name>().unwrap().into_wire();
  record.extend_from_slice(&TYPE_TXT.to_be_bytes());
  record.extend_from_slice(&CLASS_IN.to_be_bytes());
  record.extend_from_slice(&300u32.to_be_bytes());
  record.extend_from_slice(&3u16.to_be_bytes());
  record.extend_from_slice(&[0xff, b'a', b'b']);
  setup.gateway.dns_proof = record;

  assert!(matches!(
    setup.resolve(&config, "web.com", &addr_call("web.com")),
    Err(ResolveError::Rdata(enswire::rdata::Error::TxtEncoding))
  ));
}

#[test]
fn alias_rewrite_recurses_into_remote_traversal() {
  let config = config();
  let mut setup = Setup::new();

  let alias = address(0xd4);
  setup.env.kinds.insert(alias, DelegateKind::Alias);

  // sub.old.com -> sub.new.eth, which lives on the remote chain
  setup.gateway.dns_proof = txt_record("sub.old.com", format!("ENS1 {alias} old.com new.eth").as_bytes());

  let new_registry = address(0x40);
  let resolver = address(0xa5);
  let rewritten = "sub.new.eth".parse::<Name>().unwrap();
  let owner = address(0x66);

  {
    let chain = &mut setup.gateway.chain;
    chain.register(config.eth_registry, "new", entry(new_registry, Address::ZERO, LATER));
    chain.register(new_registry, "sub", entry(Address::ZERO, resolver, LATER));
    chain.set_addr(
      resolver,
      rewritten.node(),
      CoinType(U256::from(CoinType::ETH)),
      owner.as_slice(),
    );
  }

  let answer = setup
    .resolve(&config, "sub.old.com", &addr_call("sub.old.com"))
    .unwrap();
  assert_eq!(answer, owner.abi_encode());
}

#[test]
fn registry_continuation_resumes_traversal() {
  let config = config();
  let mut setup = Setup::new();

  let continuation = address(0xd5);
  setup
    .env
    .kinds
    .insert(continuation, DelegateKind::RegistryContinuation);

  let remote_registry = address(0x50);
  let resolver = address(0xa6);
  let name = "a.example.com".parse::<Name>().unwrap();
  let owner = address(0x88);

  setup.gateway.dns_proof = txt_record(
    "a.example.com",
    format!("ENS1 {continuation} {remote_registry} example.com").as_bytes(),
  );

  {
    let chain = &mut setup.gateway.chain;
    chain.register(remote_registry, "a", entry(Address::ZERO, resolver, LATER));
    chain.set_addr(
      resolver,
      name.node(),
      CoinType(U256::from(CoinType::ETH)),
      owner.as_slice(),
    );
  }

  let answer = setup
    .resolve(&config, "a.example.com", &addr_call("a.example.com"))
    .unwrap();
  assert_eq!(answer, owner.abi_encode());
}

#[test]
fn alias_cycles_hit_the_depth_limit() {
  let config = config();
  let mut setup = Setup::new();

  let alias = address(0xd6);
  setup.env.kinds.insert(alias, DelegateKind::Alias);

  // loop.com replaces to itself forever
  setup.gateway.dns_proof = txt_record("loop.com", format!("ENS1 {alias} loop.com").as_bytes());

  assert!(matches!(
    setup.resolve(&config, "loop.com", &addr_call("loop.com")),
    Err(ResolveError::UnreachableName(_))
  ));
}
