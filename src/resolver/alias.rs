use {super::*, enswire::Context};

/// The alias resolver family: the delegation context rewrites the
/// queried name (suffix rewrite or full replacement) and resolution
/// recurses on the result.
pub(super) fn resolve(
  resolver: &Resolver,
  context: &[u8],
  state: Resolution,
) -> Result<Outcome, ResolveError> {
  let context =
    Context::parse(context).map_err(|error| ResolveError::Delegate(error.to_string()))?;

  if let Context::Registry { .. } = context {
    return continue_with(resolver, context, state);
  }

  match context.apply(&state.name) {
    Some(rewritten) => {
      log::debug!("alias: {} -> {rewritten}", state.name);
      resolver.recurse(state, rewritten)
    }
    // the rewrite suffix did not match the queried name
    None => Ok(Outcome::Unreachable(state.original)),
  }
}

/// The registry-continuation variant: the context names a remote
/// registry and a suffix to treat as already consumed; traversal resumes
/// from there.
pub(super) fn continue_from_registry(
  resolver: &Resolver,
  context: &[u8],
  state: Resolution,
) -> Result<Outcome, ResolveError> {
  let context =
    Context::parse(context).map_err(|error| ResolveError::Delegate(error.to_string()))?;
  continue_with(resolver, context, state)
}

fn continue_with(
  resolver: &Resolver,
  context: Context,
  mut state: Resolution,
) -> Result<Outcome, ResolveError> {
  let Context::Registry { registry, suffix } = context else {
    return Err(ResolveError::Delegate(
      "registry continuation context expected".into(),
    ));
  };

  if !state.name.ends_with(&suffix) {
    return Ok(Outcome::Unreachable(state.original));
  }

  state.tier = Tier::Remote;
  resolver.remote_traversal(registry, &suffix, state)
}
