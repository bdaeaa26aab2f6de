#![no_main]

use ethhd_core::Mnemonic;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a mnemonic: Ok or Err, never a panic.
    // Anything accepted must re-parse to the same canonical phrase.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mnemonic) = Mnemonic::parse(s) {
            let again = Mnemonic::parse(mnemonic.phrase()).expect("canonical phrase re-parses");
            assert_eq!(again, mnemonic);
        }
    }
});
