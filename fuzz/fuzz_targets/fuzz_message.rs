#![no_main]

use libfuzzer_sys::fuzz_target;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sr25519::{signing_context, Keypair};

fuzz_target!(|data: &[u8]| {
    // Randomness source
    let seeded_rng = StdRng::seed_from_u64(123);

    let keypair = Keypair::generate_with(seeded_rng).expect("Error");

    // Sign the fuzzed message bytes under a fixed context
    let mut signing = signing_context(b"fuzz", data);
    let signature = keypair.sign(&mut signing).expect("Error");

    // The signature must round-trip through the wire form and verify
    let decoded = sr25519::Signature::from_bytes(signature.to_bytes()).expect("Error");

    let mut verifying = signing_context(b"fuzz", data);
    let result = keypair.verify(&decoded, &mut verifying).expect("Error");

    assert!(result);
});
