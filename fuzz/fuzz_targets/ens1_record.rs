#![no_main]

use {
  enswire::{Context, Ens1Record},
  libfuzzer_sys::fuzz_target,
};

fuzz_target!(|data: &[u8]| {
  if let Some(record) = Ens1Record::parse(data) {
    let _ = Context::parse(&record.context);
  }
});
