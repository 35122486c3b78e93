use {
  super::*,
  enswire::{
    entry::slots,
    program::{subprogram, EXIT_EXPIRED, EXIT_NO_RESOLVER, STOP_ON_FAILURE},
  },
};

/// Named output slots of a traversal request. Slots 0 and 1 are working
/// state ("current registry" and "last non-zero resolver"); per-profile
/// answers start at [`OUTPUT_PROFILE_BASE`].
pub const OUTPUT_REGISTRY: u8 = 0;
pub const OUTPUT_RESOLVER: u8 = 1;
pub const OUTPUT_DEFAULT_ADDRESS: u8 = 2;
pub const OUTPUT_PROFILE_BASE: u8 = 3;

/// Field offsets within the packed entry words (see `enswire::entry`).
const ENTRY_EXPIRY_OFFSET: usize = 20;
const ENTRY_EXPIRY_LEN: usize = 8;
const ADDRESS_LEN: usize = 20;

/// Builds the canonical traversal program: walk the remote registry
/// chain label by label starting at the known ancestor, then read one
/// record per requested profile from the resolver that won.
///
/// Returns `None` when every profile call failed validation locally, in
/// which case there is nothing to fetch.
pub(super) fn build(
  registry: Address,
  consumed_suffix: &Name,
  state: &Resolution,
) -> Result<Option<GatewayRequest>, ResolveError> {
  if state.profiles.iter().all(|profile| profile.is_err()) {
    return Ok(None);
  }

  // one named output per call; the index space is a u8, so oversized
  // batches are rejected rather than truncated
  let outputs = u8::try_from(usize::from(OUTPUT_PROFILE_BASE) + state.profiles.len())
    .map_err(|_| ResolveError::BatchTooLarge(state.profiles.len()))?;
  let node = state.name.node();

  let remaining = state
    .name
    .strip_suffix(consumed_suffix)
    .unwrap_or(state.name.as_wire());

  let mut request = GatewayRequest::new(outputs)
    .push_address(registry)
    .set_output(OUTPUT_REGISTRY);

  // push per-label canonical IDs leaf first, so the loop pops root first
  // and the walk runs strictly root-to-leaf
  let mut count = 0u8;
  let mut offset = 0;
  while offset < remaining.len() {
    let len = usize::from(remaining[offset]);
    if len == 0 {
      break;
    }
    let label = &remaining[offset + 1..offset + 1 + len];
    request = request.push_word(canonical_id(keccak256(label)));
    offset += 1 + len;
    count = count.checked_add(1).ok_or(ResolveError::NameTooLong)?;
  }

  request = request
    .push_program(hop_body())
    .eval_loop(STOP_ON_FAILURE, count)
    .push_output(OUTPUT_RESOLVER)
    .require_nonzero(EXIT_NO_RESOLVER)
    .push_output(OUTPUT_RESOLVER)
    .target();

  // the default EVM address record, used as a fallback for empty
  // EVM-flavored address answers
  request = request
    .set_slot(slots::ADDRESSES)
    .push_word(node)
    .follow()
    .push(CoinType::evm(0).0.to_be_bytes::<32>().to_vec())
    .follow()
    .read_bytes()
    .set_output(OUTPUT_DEFAULT_ADDRESS);

  for (i, profile) in state.profiles.iter().enumerate() {
    let output = OUTPUT_PROFILE_BASE + u8::try_from(i).unwrap();
    let Ok(profile) = profile else {
      // unsupported profile: the slot stays empty and the failure is
      // reported at assembly time
      continue;
    };

    request = match profile {
      ProfileCall::AddrLegacy { .. } => request
        .set_slot(slots::ADDRESSES)
        .push_word(node)
        .follow()
        .push(U256::from(CoinType::ETH).to_be_bytes::<32>().to_vec())
        .follow(),
      ProfileCall::Addr { coin_type, .. } => request
        .set_slot(slots::ADDRESSES)
        .push_word(node)
        .follow()
        .push(coin_type.0.to_be_bytes::<32>().to_vec())
        .follow(),
      ProfileCall::Text { key, .. } => request
        .set_slot(slots::TEXTS)
        .push_word(node)
        .follow()
        .push(key.as_bytes().to_vec())
        .follow(),
      ProfileCall::Contenthash { .. } => {
        request.set_slot(slots::CONTENTHASH).push_word(node).follow()
      }
      ProfileCall::Pubkey { .. } => request.set_slot(slots::PUBKEY).push_word(node).follow(),
      ProfileCall::Name { .. } => request.set_slot(slots::NAMES).push_word(node).follow(),
    };

    request = request.read_bytes().set_output(output);
  }

  Ok(Some(request))
}

/// The per-hop sub-program. Iteration stack starts with one argument,
/// the hop's canonical label ID.
fn hop_body() -> Vec<enswire::Op> {
  subprogram()
    // entries[registry][canonicalId]
    .push_output(OUTPUT_REGISTRY)
    .target()
    .set_slot(slots::ENTRIES)
    .follow()
    .read()
    // require expiry > now, else abort this hop only
    .dup()
    .slice(ENTRY_EXPIRY_OFFSET, ENTRY_EXPIRY_LEN)
    .push_time()
    .gt()
    .assert_nonzero(EXIT_EXPIRED)
    // the sub-registry becomes the next hop's target
    .dup()
    .slice(0, ADDRESS_LEN)
    .set_output(OUTPUT_REGISTRY)
    // last non-zero resolver wins
    .offset(1)
    .read()
    .slice(0, ADDRESS_LEN)
    .set_output_nonzero(OUTPUT_RESOLVER)
    .ops
}

/// Decodes a verified gateway response into the final answer, applying
/// the default-address fallback and the multicall fan-in rules.
pub(super) fn interpret(
  _resolver: &Resolver,
  state: Resolution,
  response: &GatewayResponse,
) -> Result<Outcome, ResolveError> {
  match response.exit_code {
    0 => {}
    EXIT_NO_RESOLVER => return Ok(Outcome::Unreachable(state.original)),
    code => return Err(ResolveError::Gateway(format!("exit code {code}"))),
  }

  let empty = Vec::new();
  let default_address = response
    .outputs
    .get(usize::from(OUTPUT_DEFAULT_ADDRESS))
    .unwrap_or(&empty);

  let mut answers = Vec::with_capacity(state.profiles.len());

  for (i, profile) in state.profiles.iter().enumerate() {
    let answer = profile
      .as_ref()
      .map_err(|error| error.clone().into())
      .and_then(|profile| {
        let raw = response
          .outputs
          .get(usize::from(OUTPUT_PROFILE_BASE) + i)
          .unwrap_or(&empty);
        let raw = substitute_default(profile, raw, default_address);
        profile.encode_answer(raw).map_err(ResolveError::from)
      });

    match answer {
      Ok(answer) => answers.push(answer),
      Err(error) => {
        // a batch reports per-call failures in-band, even if every call
        // fails; a single call re-raises the first failure verbatim
        if !state.is_batch() {
          return Err(error);
        }
        answers.push(profile::encode_error(&error.to_string()));
      }
    }
  }

  Ok(Outcome::Done(state.calls.encode_answers(answers)))
}

/// Substitutes the default EVM address only when the specific record is
/// empty and the requested coin type is recognizably EVM-derived.
fn substitute_default<'a>(
  profile: &ProfileCall,
  raw: &'a [u8],
  default_address: &'a [u8],
) -> &'a [u8] {
  if !raw.is_empty() {
    return raw;
  }
  match profile {
    ProfileCall::AddrLegacy { .. } => default_address,
    ProfileCall::Addr { coin_type, .. } if coin_type.is_evm() => default_address,
    _ => raw,
  }
}

/// The no-fetch short circuit: every profile call failed validation.
pub(super) fn aggregate_failure(state: &Resolution) -> Result<Outcome, ResolveError> {
  if !state.is_batch() {
    let error = match &state.profiles[0] {
      Err(error) => error.clone(),
      Ok(_) => unreachable!("aggregate_failure requires all-failed profiles"),
    };
    return Err(error.into());
  }

  let answers = state
    .profiles
    .iter()
    .map(|profile| match profile {
      Err(error) => profile::encode_error(&error.to_string()),
      Ok(_) => unreachable!("aggregate_failure requires all-failed profiles"),
    })
    .collect();

  Ok(Outcome::Done(state.calls.encode_answers(answers)))
}
