#![no_main]

use {enswire::RecordIter, libfuzzer_sys::fuzz_target};

fuzz_target!(|data: &[u8]| {
  for record in RecordIter::new(data) {
    let Ok(record) = record else {
      break;
    };
    let _ = record.txt_value();
  }
});
