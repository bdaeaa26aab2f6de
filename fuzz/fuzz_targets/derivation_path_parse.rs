#![no_main]

use ethhd_core::DerivationPath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(path) = s.parse::<DerivationPath>() {
            // Display is canonical: it parses back to the same path.
            let rendered = path.to_string();
            assert_eq!(rendered.parse::<DerivationPath>().ok(), Some(path));
        }
    }
});
