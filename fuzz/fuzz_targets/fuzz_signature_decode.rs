#![no_main]

use libfuzzer_sys::fuzz_target;

use sr25519::Signature;

fuzz_target!(|data: &[u8]| {
    if data.len() < 64 {
        return;
    }

    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&data[..64]);

    // Decoding arbitrary bytes must never panic, and anything that decodes
    // must survive a re-encode/decode cycle
    if let Ok(sig) = Signature::from_bytes(bytes) {
        let rt = Signature::from_bytes(sig.to_bytes()).expect("Error");
        assert_eq!(sig, rt);
    }
});
