use super::*;

/// A parsed `ENS1 ` TXT delegation record: a delegate resolver specifier
/// and an opaque context blob forwarded to context-aware delegates.
#[derive(Debug, Clone, PartialEq)]
pub struct Ens1Record {
  pub delegate: DelegateSpec,
  pub context: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateSpec {
  /// A literal `0x`-prefixed 40-hex-digit resolver address.
  Address(Address),
  /// A name to be resolved through the registry hierarchy to find the
  /// delegate resolver.
  Name(Name),
}

impl Ens1Record {
  pub const PREFIX: &'static [u8] = b"ENS1 ";

  /// Parses a TXT value. Returns `None` if the value does not carry the
  /// literal prefix or the specifier is empty; a specifier that is not a
  /// valid hex address is treated as a name to resolve, not an error.
  pub fn parse(value: &[u8]) -> Option<Self> {
    let rest = value.strip_prefix(Self::PREFIX)?;

    let (specifier, context) = match rest.iter().position(|&byte| byte == b' ') {
      Some(space) => (&rest[..space], rest[space + 1..].to_vec()),
      None => (rest, Vec::new()),
    };

    if specifier.is_empty() {
      return None;
    }

    let delegate = match parse_address(specifier) {
      Some(address) => DelegateSpec::Address(address),
      None => DelegateSpec::Name(
        std::str::from_utf8(specifier)
          .ok()?
          .parse::<Name>()
          .ok()?,
      ),
    };

    Some(Self { delegate, context })
  }
}

/// Strict `0x` + 40 hex digits; anything else is not an address literal.
pub fn parse_address(bytes: &[u8]) -> Option<Address> {
  let digits = bytes.strip_prefix(b"0x")?;
  if digits.len() != 40 {
    return None;
  }
  let mut raw = [0u8; 20];
  hex::decode_to_slice(digits, &mut raw).ok()?;
  Some(Address::from(raw))
}

/// The context sub-grammar consumed by the alias/registry resolver family.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
  /// `"<old> <new>"`: rewrite a trailing `old` suffix to `new`.
  Rewrite { old: Name, new: Name },
  /// A single token: resolve this name instead of the queried one.
  Replace(Name),
  /// `"0x<40-hex> <suffix>"`: continue traversal from a remote registry,
  /// treating `suffix` as already consumed.
  Registry { registry: Address, suffix: Name },
}

impl Context {
  pub fn parse(context: &[u8]) -> Result<Self, Error> {
    let context = std::str::from_utf8(context).map_err(|_| Error::NotUtf8)?;

    match context.split_once(' ') {
      Some((first, rest)) => {
        if let Some(registry) = parse_address(first.as_bytes()) {
          Ok(Self::Registry {
            registry,
            suffix: rest.parse()?,
          })
        } else {
          Ok(Self::Rewrite {
            old: first.parse()?,
            new: rest.parse()?,
          })
        }
      }
      None => Ok(Self::Replace(context.parse()?)),
    }
  }

  /// Applies a rewrite or replacement to the queried name. `None` means
  /// the context does not apply (rewrite suffix absent, or a registry
  /// continuation, which has no name transformation).
  pub fn apply(&self, name: &Name) -> Option<Name> {
    match self {
      Self::Rewrite { old, new } => name.replace_suffix(old, new),
      Self::Replace(replacement) => Some(replacement.clone()),
      Self::Registry { .. } => None,
    }
  }
}

#[derive(Debug, PartialEq, Error)]
pub enum Error {
  #[error("context is not UTF-8")]
  NotUtf8,
  #[error("malformed name in context: {0}")]
  Name(#[from] name::Error),
}
