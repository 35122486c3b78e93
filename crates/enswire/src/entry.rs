use super::*;

/// Storage slot indices on the remote targets. These are part of the
/// protocol contract between the request builder and the contracts it
/// reads: a mismatch produces failed verification or silently wrong
/// reads, so they must track the deployed layout exactly.
pub mod slots {
  /// Registry: `entries` mapping, keyed by canonical ID.
  pub const ENTRIES: u64 = 3;

  /// Dedicated resolver: record storage, all keyed by node.
  pub const VERSIONS: u64 = 0;
  pub const ADDRESSES: u64 = 1;
  pub const TEXTS: u64 = 2;
  pub const CONTENTHASH: u64 = 3;
  pub const PUBKEY: u64 = 4;
  pub const INTERFACES: u64 = 5;
  pub const ABIS: u64 = 6;
  pub const NAMES: u64 = 7;
  pub const WILDCARD: u64 = 8;
}

/// A registry's record for one child label. Occupies two packed words:
///
/// word 0: `subregistry (20) ++ expiry (8, BE) ++ token_version (4, BE)`
/// word 1: `resolver (20) ++ acl_epoch (4, BE) ++ zero padding (8)`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
  pub subregistry: Address,
  pub resolver: Address,
  pub expiry: u64,
  pub token_version: u32,
  pub acl_epoch: u32,
}

impl RegistryEntry {
  pub fn load(words: [[u8; 32]; 2]) -> Self {
    let [word0, word1] = words;
    Self {
      subregistry: Address::from_slice(&word0[..20]),
      expiry: u64::from_be_bytes(word0[20..28].try_into().unwrap()),
      token_version: u32::from_be_bytes(word0[28..32].try_into().unwrap()),
      resolver: Address::from_slice(&word1[..20]),
      acl_epoch: u32::from_be_bytes(word1[20..24].try_into().unwrap()),
    }
  }

  pub fn store(self) -> [[u8; 32]; 2] {
    let mut word0 = [0u8; 32];
    word0[..20].copy_from_slice(self.subregistry.as_slice());
    word0[20..28].copy_from_slice(&self.expiry.to_be_bytes());
    word0[28..32].copy_from_slice(&self.token_version.to_be_bytes());

    let mut word1 = [0u8; 32];
    word1[..20].copy_from_slice(self.resolver.as_slice());
    word1[20..24].copy_from_slice(&self.acl_epoch.to_be_bytes());

    [word0, word1]
  }

  /// Expiry is exclusive: an entry expiring exactly now is already gone.
  pub fn expired(&self, now: u64) -> bool {
    self.expiry <= now
  }

  /// An expired entry reads as absent for traversal purposes, even though
  /// the underlying storage is not cleared.
  pub fn live(&self, now: u64) -> Option<&Self> {
    (!self.expired(now)).then_some(self)
  }
}

/// The number of low-order identifier bits that carry mutable version
/// state.
const VERSION_BITS: usize = 32;

/// The stable storage key for a label: the label hash with the mutable
/// version bits zeroed. Survives expiry and role-change regenerations.
pub fn canonical_id(label_hash: B256) -> B256 {
  let mut id = label_hash;
  for byte in &mut id.0[32 - VERSION_BITS / 8..] {
    *byte = 0;
  }
  id
}

/// The identifier presented to holders and marketplaces: the canonical ID
/// with the current version counters in the low-order bits, so listings
/// and approvals lapse automatically when either counter bumps.
pub fn external_id(label_hash: B256, token_version: u32, acl_epoch: u32) -> B256 {
  let mut id = canonical_id(label_hash);
  let low = (token_version & 0xffff) << 16 | (acl_epoch & 0xffff);
  id.0[28..].copy_from_slice(&low.to_be_bytes());
  id
}
