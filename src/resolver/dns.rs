use {
  super::*,
  enswire::{
    ens1::DelegateSpec,
    rdata::{RecordIter, CLASS_IN, TYPE_TXT},
    Ens1Record,
  },
};

/// Re-entry for the DNS fallback path: verify the signed RR set, scan
/// TXT records at the queried name in wire order, and hand off to the
/// first record that successfully delegates.
pub(super) fn callback(
  resolver: &Resolver,
  state: Resolution,
  proof: &[u8],
) -> Result<Outcome, ResolveError> {
  let answer = resolver.oracle.verify(proof)?;

  let mut state = Some(state);

  for record in RecordIter::new(&answer) {
    let record = record?;

    // owner name, class, and type must match exactly
    if record.owner != state.as_ref().unwrap().name
      || record.class != CLASS_IN
      || record.rtype != TYPE_TXT
    {
      continue;
    }

    // malformed chunking is a hard error; the record cannot be trusted
    let value = record.txt_value()?;

    let Some(ens1) = Ens1Record::parse(&value) else {
      continue;
    };

    let delegate = match ens1.delegate {
      DelegateSpec::Address(address) => Some(address),
      // a named delegate is itself resolved through the local hierarchy;
      // failure to resolve is "no delegate", not a hard error
      DelegateSpec::Name(ref name) => resolver.local_resolver(name),
    };

    let Some(delegate) = delegate else {
      log::debug!("no delegate for TXT record, trying next");
      continue;
    };

    let context = (!ens1.context.is_empty()).then_some(ens1.context.as_slice());

    // the first record that reaches a delegate wins; a failing delegate
    // call propagates rather than falling through to later records
    return resolver.dispatch_delegate(delegate, context, state.take().unwrap());
  }

  Ok(Outcome::Unreachable(
    state.map(|state| state.original).unwrap_or_else(Name::root),
  ))
}
