//! # sr25519 Schnorr Signature and VRF Library
//!
//! This Rust library implements the sr25519 signature scheme used across the
//! Polkadot/Substrate ecosystem: Schnorr signatures over the Ristretto255
//! prime-order group built on the curve25519_dalek library, with Merlin
//! transcripts supplying all domain separation.
//!
//! ## Overview of the scheme
//!
//! All operations speak in terms of transcripts rather than raw messages. A
//! signer and verifier each build the same transcript (usually through
//! [`signing_context`]) and the protocol binds its values to that evolving
//! state, so the same keys can safely participate in many protocols without
//! cross-protocol replay.
//!
//! - Key generation: a 32-byte [`MiniSecretKey`] seed expands
//!   deterministically into a [`SecretKey`] holding a secret scalar `x` and a
//!   signing nonce; the corresponding [`PublicKey`] is `X = x * B`, where `B`
//!   is the Ristretto base point.
//! - Signing: `(R, s) = (r * B, k * x + r)`, where `r` is a witness scalar
//!   bound to the transcript and the key's nonce, and `k` is the transcript
//!   challenge after committing the public key and `R`.
//! - Verification: recompute `k` the same way and check `s * B - k * X == R`.
//!
//! ## Batch verification
//!
//! Many `(transcript, signature, public key)` entries can be folded into a
//! single multiscalar equation, either in one shot through [`verify_batch`]
//! or incrementally through [`BatchVerifier`]. The folded check is the plain
//! sum used across the sr25519 ecosystem; a randomized variant is provided
//! for adversarial settings.
//!
//! ## Hierarchical key derivation
//!
//! Keys derive children under 32-byte chain codes. Soft derivation
//! ([`derive_key_simple`]) works from either the secret or the public half
//! and the two paths agree on the child public key; hard derivation
//! ([`derive_key_hard`]) consumes the secret scalar and has no public
//! counterpart.
//!
//! ## VRF
//!
//! The verifiable random function hashes a transcript to an input point,
//! multiplies it by the secret scalar, and proves the multiplication with a
//! Schnorr DLEQ proof. Verifiers receive only the 32-byte pre-output and
//! re-derive the input themselves. [`VrfContext`] selects between the label
//! ordering deployed on Kusama (the default) and the corrected upstream
//! ordering. [`VrfInOut::make_bytes`] turns an accepted pair into
//! application randomness.
//!
//! ## Usage
//!
//! ```
//! use sr25519::{signing_context, Keypair};
//!
//! let keypair = Keypair::generate()?;
//!
//! let mut signing = signing_context(b"example", b"hello world");
//! let signature = keypair.sign(&mut signing)?;
//!
//! let mut verifying = signing_context(b"example", b"hello world");
//! assert!(keypair.verify(&signature, &mut verifying)?);
//! # Ok::<(), sr25519::Error>(())
//! ```

pub mod batch;
pub mod derive;
pub mod errors;
pub mod keys;
pub mod sign;
pub mod transcript;
pub mod vrf;

mod helpers;
mod scalars;

pub use crate::batch::{verify_batch, BatchVerifier};
pub use crate::derive::{
    derive_key_hard, derive_key_simple, ChainCode, DerivableKey, ExtendedKey, CHAIN_CODE_LENGTH,
};
pub use crate::errors::{Error, Result};
pub use crate::keys::{
    Keypair, MiniSecretKey, PublicKey, SecretKey, MINI_SECRET_KEY_LENGTH, NONCE_LENGTH,
    PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
};
pub use crate::sign::{Signature, SIGNATURE_LENGTH};
pub use crate::transcript::{signing_context, TranscriptProtocol};
pub use crate::vrf::{
    VrfContext, VrfInOut, VrfOutput, VrfProof, VRF_OUTPUT_LENGTH, VRF_PROOF_LENGTH,
};

/// Generates a fresh keypair from the operating system CSPRNG.
///
/// Shorthand for [`Keypair::generate`].
pub fn generate_keypair() -> Result<Keypair> {
    Keypair::generate()
}
