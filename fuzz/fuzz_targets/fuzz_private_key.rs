#![no_main]

use libfuzzer_sys::fuzz_target;

use sha2::{Digest, Sha256};
use sr25519::{signing_context, MiniSecretKey};

fuzz_target!(|data: &[u8]| {
    // Message to be signed
    let message = b"Hello world";

    // Derive a seed from the fuzzed bytes
    let seed: [u8; 32] = Sha256::digest(data).into();
    let mini = MiniSecretKey::from_bytes(seed);

    let secret = mini.expand_ed25519();
    let public = mini.public();

    let mut signing = signing_context(b"fuzz", message);
    let signature = secret.sign(&mut signing).expect("Error");

    let mut verifying = signing_context(b"fuzz", message);
    let result = public.verify(&signature, &mut verifying).expect("Error");

    assert!(result);
});
