use super::*;

/// A hierarchical name in DNS wire format: a sequence of length-prefixed
/// labels terminated by a zero-length label. The root name is a single
/// zero byte.
#[derive(Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Name(Vec<u8>);

impl Name {
  pub const MAX_LABEL: usize = 255;

  pub fn root() -> Self {
    Self(vec![0])
  }

  pub fn is_root(&self) -> bool {
    self.0 == [0]
  }

  /// Decodes a name from wire bytes, validating that every label length
  /// stays in bounds and that the terminator is reached exactly at the end
  /// of the buffer.
  pub fn from_wire(wire: &[u8]) -> Result<Self, Error> {
    let mut i = 0;
    loop {
      let Some(&len) = wire.get(i) else {
        return Err(Error::UnterminatedName);
      };
      let len = usize::from(len);
      if len == 0 {
        if i + 1 != wire.len() {
          return Err(Error::TrailingBytes);
        }
        return Ok(Self(wire.to_vec()));
      }
      i += 1 + len;
      if i >= wire.len() {
        return Err(Error::UnterminatedName);
      }
    }
  }

  /// Builds a name from raw label byte strings, leaf first.
  pub fn from_labels<I, L>(labels: I) -> Result<Self, Error>
  where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
  {
    let mut wire = Vec::new();
    for label in labels {
      let label = label.as_ref();
      if label.is_empty() {
        return Err(Error::EmptyLabel);
      }
      if label.len() > Self::MAX_LABEL {
        return Err(Error::LabelTooLong(label.len()));
      }
      if label.contains(&0) {
        return Err(Error::NulInLabel);
      }
      wire.push(u8::try_from(label.len()).unwrap());
      wire.extend_from_slice(label);
    }
    wire.push(0);
    Ok(Self(wire))
  }

  pub fn as_wire(&self) -> &[u8] {
    &self.0
  }

  pub fn into_wire(self) -> Vec<u8> {
    self.0
  }

  /// Iterates labels leaf to root.
  pub fn labels(&self) -> Labels<'_> {
    Labels {
      wire: &self.0,
      offset: 0,
    }
  }

  pub fn label_count(&self) -> usize {
    self.labels().count()
  }

  /// The name with the leaf-most label removed. Returns `None` for the
  /// root name.
  pub fn parent(&self) -> Option<Self> {
    if self.is_root() {
      return None;
    }
    let skip = 1 + usize::from(self.0[0]);
    Some(Self(self.0[skip..].to_vec()))
  }

  /// keccak256 of the leaf-most label, the key under which registries
  /// store child entries.
  pub fn leaf_label_hash(&self) -> Option<B256> {
    let label = self.labels().next()?;
    Some(keccak256(label))
  }

  /// The EIP-137 namehash: accumulate `keccak(parent ++ keccak(label))`
  /// from the terminator backward, starting from the zero node.
  pub fn node(&self) -> B256 {
    fn hash(wire: &[u8]) -> B256 {
      if wire[0] == 0 {
        return B256::ZERO;
      }
      let len = usize::from(wire[0]);
      let parent = hash(&wire[1 + len..]);
      let label = keccak256(&wire[1..1 + len]);
      let mut buffer = [0u8; 64];
      buffer[..32].copy_from_slice(parent.as_slice());
      buffer[32..].copy_from_slice(label.as_slice());
      keccak256(buffer)
    }
    hash(&self.0)
  }

  /// True if `suffix`'s labels are a trailing subsequence of this name's
  /// labels.
  pub fn ends_with(&self, suffix: &Name) -> bool {
    self.strip_suffix(suffix).is_some()
  }

  /// Splits off a matching trailing label sequence, returning the wire
  /// bytes of the unmatched leading labels (without a terminator).
  pub fn strip_suffix(&self, suffix: &Name) -> Option<&[u8]> {
    if self.0.len() < suffix.0.len() {
      return None;
    }
    let split = self.0.len() - suffix.0.len();
    if self.0[split..] != suffix.0 {
      return None;
    }
    // the split point must fall on a label boundary
    let mut i = 0;
    while i < split {
      i += 1 + usize::from(self.0[i]);
    }
    (i == split).then(|| &self.0[..split])
  }

  /// Rewrites a trailing `old` suffix to `new`, preserving the unmatched
  /// leading labels. Returns `None` if `old` is not a suffix of this name.
  pub fn replace_suffix(&self, old: &Name, new: &Name) -> Option<Self> {
    let prefix = self.strip_suffix(old)?;
    let mut wire = Vec::with_capacity(prefix.len() + new.0.len());
    wire.extend_from_slice(prefix);
    wire.extend_from_slice(&new.0);
    Some(Self(wire))
  }
}

pub struct Labels<'a> {
  wire: &'a [u8],
  offset: usize,
}

impl<'a> Iterator for Labels<'a> {
  type Item = &'a [u8];

  fn next(&mut self) -> Option<Self::Item> {
    let len = usize::from(self.wire[self.offset]);
    if len == 0 {
      return None;
    }
    let start = self.offset + 1;
    self.offset = start + len;
    Some(&self.wire[start..start + len])
  }
}

impl Display for Name {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    if self.is_root() {
      return write!(f, ".");
    }
    for (i, label) in self.labels().enumerate() {
      if i > 0 {
        write!(f, ".")?;
      }
      for &byte in label {
        match byte {
          b'.' | b'\\' => write!(f, "\\{}", byte as char)?,
          0x20..=0x7e => write!(f, "{}", byte as char)?,
          _ => write!(f, "\\x{byte:02x}")?,
        }
      }
    }
    Ok(())
  }
}

impl fmt::Debug for Name {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "Name({self})")
  }
}

impl FromStr for Name {
  type Err = Error;

  /// Inverse of `Display`: `\.` and `\\` unescape to the literal byte,
  /// `\xNN` to an arbitrary byte, unescaped `.` separates labels.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() || s == "." {
      return Ok(Self::root());
    }

    let bytes = s.as_bytes();
    let mut labels = Vec::new();
    let mut label = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
      match bytes[i] {
        b'.' => {
          labels.push(std::mem::take(&mut label));
          i += 1;
        }
        b'\\' => match bytes.get(i + 1) {
          Some(b'x') => {
            let digits = bytes.get(i + 2..i + 4).ok_or(Error::BadEscape)?;
            let mut byte = [0u8];
            hex::decode_to_slice(digits, &mut byte).map_err(|_| Error::BadEscape)?;
            label.push(byte[0]);
            i += 4;
          }
          Some(&escaped) => {
            label.push(escaped);
            i += 2;
          }
          None => return Err(Error::BadEscape),
        },
        byte => {
          label.push(byte);
          i += 1;
        }
      }
    }
    labels.push(label);

    Self::from_labels(labels)
  }
}

#[derive(Debug, PartialEq, Error)]
pub enum Error {
  #[error("bad escape sequence")]
  BadEscape,
  #[error("empty label")]
  EmptyLabel,
  #[error("label length {0} exceeds maximum")]
  LabelTooLong(usize),
  #[error("NUL byte in label")]
  NulInLabel,
  #[error("name data continues past terminator")]
  TrailingBytes,
  #[error("name is not terminated")]
  UnterminatedName,
}
