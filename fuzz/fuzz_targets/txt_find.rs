#![no_main]

use {arbitrary::Arbitrary, enswire::txt, libfuzzer_sys::fuzz_target};

#[derive(Arbitrary, Debug)]
struct Input {
  data: Vec<u8>,
  key: Vec<u8>,
}

fuzz_target!(|input: Input| {
  txt::find(&input.data, &input.key);
});
