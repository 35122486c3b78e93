#![no_main]

use {enswire::Name, libfuzzer_sys::fuzz_target};

fuzz_target!(|data: &[u8]| {
  if let Ok(name) = Name::from_wire(data) {
    // accepted wire must survive a display/parse round trip
    let redisplayed = name.to_string();
    assert_eq!(redisplayed.parse::<Name>().unwrap(), name);
    name.node();
    let labels = name.labels().count();
    assert_eq!(name.label_count(), labels);
  }
});
