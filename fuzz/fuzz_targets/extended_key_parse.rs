#![no_main]

use ethhd_core::{ExtendedPrivateKey, ExtendedPublicKey};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(xpub) = s.parse::<ExtendedPublicKey>() {
            assert_eq!(xpub.to_string().parse::<ExtendedPublicKey>().ok(), Some(xpub));
        }
        if let Ok(xprv) = ExtendedPrivateKey::from_xprv(s) {
            assert_eq!(ExtendedPrivateKey::from_xprv(&xprv.to_xprv()).ok(), Some(xprv));
        }
    }
});
