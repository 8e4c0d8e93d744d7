use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::helpers::decode_hex;
use crate::keys::{Keypair, PublicKey, SecretKey};
use crate::scalars::{random_scalar, scalar_from_canonical_bytes};
use crate::transcript::{signing_context, TranscriptProtocol};

/// The length in bytes of an encoded [`Signature`].
pub const SIGNATURE_LENGTH: usize = 64;

/// A schnorrkel signature: the witness commitment `R` and the response
/// scalar `s`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Signature {
    pub(crate) r: RistrettoPoint,
    pub(crate) s: Scalar,
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.r.ct_eq(&other.r) & self.s.ct_eq(&other.s))
    }
}

impl Eq for Signature {}

impl Signature {
    /// Serializes to the 64-byte wire form: `R || s`, with the high bit of
    /// byte 63 set to mark the encoding as schnorrkel rather than ed25519.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.compress().as_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out[63] |= 128;
        out
    }

    /// Deserializes the 64-byte wire form, requiring the schnorrkel marker
    /// bit and clearing it before decoding the scalar.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Result<Self> {
        if bytes[63] & 128 == 0 {
            return Err(Error::SignatureHighBitMissing);
        }

        let mut r_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&bytes[..32]);
        let r = curve25519_dalek::ristretto::CompressedRistretto(r_bytes)
            .decompress()
            .ok_or(Error::InvalidPointEncoding)?;

        let mut s_bytes = [0u8; 32];
        s_bytes.copy_from_slice(&bytes[32..]);
        s_bytes[31] &= 127;
        let s = scalar_from_canonical_bytes(s_bytes)?;

        Ok(Signature { r, s })
    }

    /// Parses a hex-encoded signature, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(decode_hex(s)?)
    }
}

impl SecretKey {
    /// Signs the transcript.
    ///
    /// The witness scalar is drawn from an RNG bound to the transcript
    /// state, re-keyed with this key's nonce and topped up with OS entropy,
    /// so a broken system RNG alone cannot leak the secret scalar.
    #[tracing::instrument(name = "Signing the transcript", skip_all)]
    pub fn sign(&self, t: &mut Transcript) -> Result<Signature> {
        t.proto_name(b"Schnorr-sig");

        let public = self.public()?;
        t.append_point(b"sign:pk", public.as_compressed());

        let mut witness = t.witness_rng(b"signing", &self.nonce(), &mut rand::thread_rng());
        let r = Zeroizing::new(random_scalar(&mut witness));
        let big_r = *r * RISTRETTO_BASEPOINT_POINT;
        t.append_point(b"sign:R", &big_r.compress());

        let k = t.challenge_scalar(b"sign:c");
        let x = Zeroizing::new(self.scalar()?);

        let s = k * *x + *r;

        Ok(Signature { r: big_r, s })
    }

    /// Signs `message` under the given signing context.
    pub fn sign_simple(&self, context: &[u8], message: &[u8]) -> Result<Signature> {
        let mut t = signing_context(context, message);
        self.sign(&mut t)
    }
}

impl PublicKey {
    /// Verifies a signature over the transcript.
    ///
    /// Returns `Ok(false)` for a well-formed but wrong signature; errors
    /// are reserved for the identity public key. The identity check runs
    /// before any transcript mutation, so the caller's transcript is
    /// untouched on that failure.
    #[tracing::instrument(name = "Verifying the signature", skip_all)]
    pub fn verify(&self, signature: &Signature, t: &mut Transcript) -> Result<bool> {
        if self.is_identity() {
            return Err(Error::PublicKeyAtInfinity);
        }

        t.proto_name(b"Schnorr-sig");
        t.append_point(b"sign:pk", self.as_compressed());
        t.append_point(b"sign:R", &signature.r.compress());

        let k = t.challenge_scalar(b"sign:c");
        let expected_r = signature.s * RISTRETTO_BASEPOINT_POINT - k * self.as_point();

        Ok(bool::from(expected_r.ct_eq(&signature.r)))
    }

    /// Verifies a signature over `message` under the given signing context.
    pub fn verify_simple(
        &self,
        context: &[u8],
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool> {
        let mut t = signing_context(context, message);
        self.verify(signature, &mut t)
    }
}

impl Keypair {
    /// Signs the transcript with the secret half.
    pub fn sign(&self, t: &mut Transcript) -> Result<Signature> {
        self.secret().sign(t)
    }

    /// Verifies a signature with the public half.
    pub fn verify(&self, signature: &Signature, t: &mut Transcript) -> Result<bool> {
        self.public().verify(signature, t)
    }
}
