//! Scanner for the flat `key[arg]=value` grammar used by TXT-based
//! resolver records. A record is a run of space-separated assignments;
//! values may be single-quoted with backslash escapes.

/// Extracts the value for `key` from `data`. `key` must include the
/// trailing `=` (and the literal `[arg]` bytes if the key takes an
/// argument). Returns `None` when the key is absent or its quoted value
/// is unterminated.
///
/// Single pass, no backtracking; the value is copied out rather than
/// unescaped in place.
pub fn find(data: &[u8], key: &[u8]) -> Option<Vec<u8>> {
  let mut i = 0;

  'start: while i < data.len() {
    // START: skip runs of spaces, then try to match the key literally
    while i < data.len() && data[i] == b' ' {
      i += 1;
    }

    if data.len() - i < key.len() {
      return None;
    }

    if &data[i..i + key.len()] == key {
      i += key.len();
      return value(data, i).0;
    }

    // IGNORED_KEY: scan to `=`, `[`, or space
    loop {
      if i >= data.len() {
        return None;
      }
      match data[i] {
        b'=' => {
          i += 1;
          break;
        }
        b'[' => {
          // IGNORED_KEY_ARG: scan to `]`
          while i < data.len() && data[i] != b']' {
            i += 1;
          }
          if i >= data.len() {
            return None;
          }
          i += 1;
          if data.get(i) == Some(&b'=') {
            i += 1;
          }
          // missing `=` after the arg: treat the rest of the token as an
          // unquoted value (recoverable malformed grammar)
          break;
        }
        b' ' => {
          // key with no value, recoverable
          i += 1;
          continue 'start;
        }
        _ => i += 1,
      }
    }

    // IGNORED_VALUE: skip without collecting
    let (_, next) = value(data, i);
    match next {
      Some(next) => i = next,
      None => return None,
    }
  }

  None
}

/// Scans one value starting at `i`, returning the collected bytes (None if
/// an opening quote is never closed) and the offset just past the value's
/// trailing space (None if the scan consumed the rest of the data).
fn value(data: &[u8], mut i: usize) -> (Option<Vec<u8>>, Option<usize>) {
  if data.get(i) == Some(&b'\'') {
    // QUOTED_VALUE
    i += 1;
    let mut unescaped = Vec::new();
    while i < data.len() {
      match data[i] {
        b'\\' if i + 1 < data.len() => {
          unescaped.push(data[i + 1]);
          i += 2;
        }
        b'\'' => {
          return (Some(unescaped), Some(i + 1));
        }
        byte => {
          unescaped.push(byte);
          i += 1;
        }
      }
    }
    // unterminated quote: the scan runs to the end without a match
    (None, None)
  } else {
    // UNQUOTED_VALUE
    let start = i;
    while i < data.len() && data[i] != b' ' {
      i += 1;
    }
    let end = (i < data.len()).then_some(i + 1);
    (Some(data[start..i].to_vec()), end)
  }
}
