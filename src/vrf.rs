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
use crate::transcript::TranscriptProtocol;

/// The length in bytes of an encoded [`VrfOutput`].
pub const VRF_OUTPUT_LENGTH: usize = 32;

/// The length in bytes of an encoded [`VrfProof`].
pub const VRF_PROOF_LENGTH: usize = 64;

/// Selects the DLEQ transcript layout.
///
/// Kusama launched with a label ordering that was later corrected upstream;
/// both stay verifiable, chosen at construction time rather than through
/// process-wide state. The default is the Kusama ordering, matching the
/// deployed network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrfContext {
    kusama: bool,
}

impl Default for VrfContext {
    fn default() -> Self {
        VrfContext::kusama()
    }
}

/// A VRF input/output pair: the transcript-derived input point and the
/// keyed output point `output = x·input`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VrfInOut {
    pub(crate) input: RistrettoPoint,
    pub(crate) output: RistrettoPoint,
}

/// A VRF pre-output: the output point alone, as transmitted on the wire.
/// The verifier re-derives the input from the public key and transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VrfOutput(RistrettoPoint);

/// A Schnorr DLEQ proof that the pre-output was produced by the key behind
/// a public key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VrfProof {
    pub(crate) c: Scalar,
    pub(crate) s: Scalar,
}

impl PartialEq for VrfProof {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.c.ct_eq(&other.c) & self.s.ct_eq(&other.s))
    }
}

impl Eq for VrfProof {}

impl VrfContext {
    /// The label ordering deployed on Kusama.
    pub const fn kusama() -> Self {
        VrfContext { kusama: true }
    }

    /// The corrected upstream label ordering.
    pub const fn upstream() -> Self {
        VrfContext { kusama: false }
    }

    /// Evaluates the VRF on the transcript and proves the evaluation.
    ///
    /// The input point is derived from `t` (which is mutated by the
    /// malleability-addressing public-key binding); the DLEQ proof runs on
    /// a fresh transcript so batching semantics stay independent of the
    /// caller's context.
    #[tracing::instrument(name = "Producing a VRF output and proof", skip_all)]
    pub fn sign(&self, secret: &SecretKey, t: &mut Transcript) -> Result<(VrfInOut, VrfProof)> {
        let inout = secret.vrf_create_hash(t)?;
        let mut p = Transcript::new(b"VRF");
        let proof = self.dleq_prove(&mut p, secret, &inout)?;
        Ok((inout, proof))
    }

    /// Verifies a pre-output and proof against the transcript.
    ///
    /// The identity public key is rejected before the transcript is
    /// touched. A well-formed but wrong proof yields `Ok(false)`.
    #[tracing::instrument(name = "Verifying a VRF output and proof", skip_all)]
    pub fn verify(
        &self,
        public: &PublicKey,
        t: &mut Transcript,
        output: &VrfOutput,
        proof: &VrfProof,
    ) -> Result<bool> {
        if public.is_identity() {
            return Err(Error::PublicKeyAtInfinity);
        }

        let inout = output.attach_input(public, t);
        let mut p = Transcript::new(b"VRF");
        Ok(self.dleq_verify(&mut p, public, &inout, proof))
    }

    /// Proves `log_B(pk) = log_input(output)` over the transcript `p`.
    fn dleq_prove(
        &self,
        p: &mut Transcript,
        secret: &SecretKey,
        inout: &VrfInOut,
    ) -> Result<VrfProof> {
        let public = secret.public()?;

        p.proto_name(b"DLEQProof");
        p.append_point(b"vrf:h", &inout.input.compress());
        if self.kusama {
            p.append_point(b"vrf:pk", public.as_compressed());
        }

        let mut witness = p.witness_rng(b"proving", &secret.nonce(), &mut rand::thread_rng());
        let r = Zeroizing::new(random_scalar(&mut witness));

        let kb = *r * RISTRETTO_BASEPOINT_POINT;
        let kh = *r * inout.input;
        p.append_point(b"vrf:R=g^r", &kb.compress());
        p.append_point(b"vrf:h^r", &kh.compress());

        if !self.kusama {
            p.append_point(b"vrf:pk", public.as_compressed());
            p.append_point(b"vrf:h^sk", &inout.output.compress());
        }

        let c = p.challenge_scalar(b"prove");
        let x = Zeroizing::new(secret.scalar()?);
        let s = *r - c * *x;

        Ok(VrfProof { c, s })
    }

    /// Recomputes the prover's commitments from `(c, s)` and checks that
    /// the transcript reproduces `c`.
    fn dleq_verify(
        &self,
        p: &mut Transcript,
        public: &PublicKey,
        inout: &VrfInOut,
        proof: &VrfProof,
    ) -> bool {
        p.proto_name(b"DLEQProof");
        p.append_point(b"vrf:h", &inout.input.compress());
        if self.kusama {
            p.append_point(b"vrf:pk", public.as_compressed());
        }

        // Kb' = s·B + c·pk and Kh' = s·input + c·output equal the prover's
        // commitments exactly when s = r − c·x
        let kb = proof.s * RISTRETTO_BASEPOINT_POINT + proof.c * public.as_point();
        let kh = proof.s * inout.input + proof.c * inout.output;
        p.append_point(b"vrf:R=g^r", &kb.compress());
        p.append_point(b"vrf:h^r", &kh.compress());

        if !self.kusama {
            p.append_point(b"vrf:pk", public.as_compressed());
            p.append_point(b"vrf:h^sk", &inout.output.compress());
        }

        let c = p.challenge_scalar(b"prove");
        bool::from(c.ct_eq(&proof.c))
    }
}

impl PublicKey {
    /// Hashes the transcript to the VRF input point, first binding this
    /// public key under `vrf-nm-pk` so outputs are not malleable across
    /// keys.
    pub fn vrf_hash(&self, t: &mut Transcript) -> RistrettoPoint {
        t.append_point(b"vrf-nm-pk", self.as_compressed());
        let mut hash = [0u8; 64];
        t.challenge_bytes(b"VRFHash", &mut hash);
        RistrettoPoint::from_uniform_bytes(&hash)
    }

    /// Verifies a pre-output and proof under the default (Kusama) context.
    pub fn vrf_verify(
        &self,
        t: &mut Transcript,
        output: &VrfOutput,
        proof: &VrfProof,
    ) -> Result<bool> {
        VrfContext::default().verify(self, t, output, proof)
    }
}

impl SecretKey {
    /// Evaluates the VRF on the transcript: derives the input point and
    /// multiplies it by the secret scalar.
    pub fn vrf_create_hash(&self, t: &mut Transcript) -> Result<VrfInOut> {
        let public = self.public()?;
        let input = public.vrf_hash(t);
        let x = Zeroizing::new(self.scalar()?);
        Ok(VrfInOut {
            input,
            output: *x * input,
        })
    }

    /// Evaluates and proves the VRF under the default (Kusama) context.
    pub fn vrf_sign(&self, t: &mut Transcript) -> Result<(VrfInOut, VrfProof)> {
        VrfContext::default().sign(self, t)
    }
}

impl Keypair {
    /// Evaluates and proves the VRF with the secret half.
    pub fn vrf_sign(&self, t: &mut Transcript) -> Result<(VrfInOut, VrfProof)> {
        self.secret().vrf_sign(t)
    }

    /// Verifies a pre-output and proof with the public half.
    pub fn vrf_verify(
        &self,
        t: &mut Transcript,
        output: &VrfOutput,
        proof: &VrfProof,
    ) -> Result<bool> {
        self.public().vrf_verify(t, output, proof)
    }
}

impl VrfInOut {
    /// The pre-output, for transmission alongside the proof.
    pub fn output(&self) -> VrfOutput {
        VrfOutput(self.output)
    }

    /// Extracts `len` output-bound bytes under the given extraction
    /// context, e.g. `b"substrate-babe-vrf"` for BABE randomness.
    ///
    /// Signer and verifier obtain identical bytes for the same pair.
    pub fn make_bytes(&self, len: usize, context: &[u8]) -> Vec<u8> {
        let mut t = Transcript::new(b"VRFResult");
        t.append_message(b"", context);
        t.append_point(b"vrf-in", &self.input.compress());
        t.append_point(b"vrf-out", &self.output.compress());

        let mut out = vec![0u8; len];
        t.challenge_bytes(b"", &mut out);
        out
    }
}

impl VrfOutput {
    /// Decodes a 32-byte pre-output.
    pub fn from_bytes(bytes: [u8; VRF_OUTPUT_LENGTH]) -> Result<Self> {
        let point = curve25519_dalek::ristretto::CompressedRistretto(bytes)
            .decompress()
            .ok_or(Error::InvalidPointEncoding)?;
        Ok(VrfOutput(point))
    }

    /// Parses a hex-encoded pre-output, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(decode_hex(s)?)
    }

    /// Returns the canonical 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; VRF_OUTPUT_LENGTH] {
        self.0.compress().to_bytes()
    }

    /// Reconstructs the full input/output pair by re-deriving the input
    /// point from the public key and transcript.
    pub fn attach_input(&self, public: &PublicKey, t: &mut Transcript) -> VrfInOut {
        VrfInOut {
            input: public.vrf_hash(t),
            output: self.0,
        }
    }
}

impl PartialEq for VrfOutput {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl Eq for VrfOutput {}

impl VrfProof {
    /// Decodes the 64-byte wire form `c || s`; both scalars must be
    /// canonical.
    pub fn from_bytes(bytes: [u8; VRF_PROOF_LENGTH]) -> Result<Self> {
        let mut c_bytes = [0u8; 32];
        c_bytes.copy_from_slice(&bytes[..32]);
        let mut s_bytes = [0u8; 32];
        s_bytes.copy_from_slice(&bytes[32..]);

        Ok(VrfProof {
            c: scalar_from_canonical_bytes(c_bytes)?,
            s: scalar_from_canonical_bytes(s_bytes)?,
        })
    }

    /// Serializes to the 64-byte wire form `c || s`.
    pub fn to_bytes(&self) -> [u8; VRF_PROOF_LENGTH] {
        let mut out = [0u8; VRF_PROOF_LENGTH];
        out[..32].copy_from_slice(&self.c.to_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }
}
