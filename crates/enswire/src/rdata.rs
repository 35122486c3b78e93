use super::*;

pub const CLASS_IN: u16 = 1;
pub const TYPE_TXT: u16 = 16;

/// One resource record from a verified DNS answer section.
#[derive(Debug, PartialEq)]
pub struct Record<'a> {
  pub owner: Name,
  pub rtype: u16,
  pub class: u16,
  pub ttl: u32,
  pub rdata: &'a [u8],
}

impl Record<'_> {
  /// Decodes TXT RDATA: a run of `(1-byte length, bytes)` character-string
  /// chunks whose concatenation is the logical value. The chunks must
  /// exactly consume the record boundary.
  pub fn txt_value(&self) -> Result<Vec<u8>, Error> {
    let mut value = Vec::new();
    let mut i = 0;
    while i < self.rdata.len() {
      let len = usize::from(self.rdata[i]);
      i += 1;
      if i + len > self.rdata.len() {
        return Err(Error::TxtEncoding);
      }
      value.extend_from_slice(&self.rdata[i..i + len]);
      i += len;
    }
    Ok(value)
  }
}

/// Iterates resource records in a verified answer, in wire order.
///
/// Verified RR sets are in DNSSEC canonical form, so owner names are
/// uncompressed; a compression pointer is malformed input here.
pub struct RecordIter<'a> {
  data: &'a [u8],
  offset: usize,
}

impl<'a> RecordIter<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self { data, offset: 0 }
  }

  fn record(&mut self) -> Result<Record<'a>, Error> {
    let start = self.offset;

    loop {
      let &len = self.data.get(self.offset).ok_or(Error::Truncated)?;
      if len == 0 {
        self.offset += 1;
        break;
      }
      if len & 0xc0 != 0 {
        return Err(Error::CompressedName);
      }
      self.offset += 1 + usize::from(len);
    }

    let owner = Name::from_wire(&self.data[start..self.offset])?;

    let rtype = self.u16()?;
    let class = self.u16()?;
    let ttl = u32::from(self.u16()?) << 16 | u32::from(self.u16()?);

    let rdlength = usize::from(self.u16()?);
    if self.offset + rdlength > self.data.len() {
      return Err(Error::Truncated);
    }
    let rdata = &self.data[self.offset..self.offset + rdlength];
    self.offset += rdlength;

    Ok(Record {
      owner,
      rtype,
      class,
      ttl,
      rdata,
    })
  }

  fn u16(&mut self) -> Result<u16, Error> {
    let bytes = self
      .data
      .get(self.offset..self.offset + 2)
      .ok_or(Error::Truncated)?;
    self.offset += 2;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
  }
}

impl<'a> Iterator for RecordIter<'a> {
  type Item = Result<Record<'a>, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.offset >= self.data.len() {
      return None;
    }
    Some(self.record())
  }
}

#[derive(Debug, PartialEq, Error)]
pub enum Error {
  #[error("compressed owner name in verified record")]
  CompressedName,
  #[error("malformed owner name: {0}")]
  Name(#[from] name::Error),
  #[error("record data truncated")]
  Truncated,
  #[error("TXT character-string overruns record boundary")]
  TxtEncoding,
}
