#![no_main]

use ethhd_core::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(address) = s.parse::<Address>() {
            // The checksummed form always validates.
            assert_eq!(address.to_checksum().parse::<Address>().ok(), Some(address));
        }
    }
});
