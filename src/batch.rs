use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{IsIdentity, VartimeMultiscalarMul};
use merlin::Transcript;
use rand::Rng;
use rand_core::{CryptoRng, RngCore};

use crate::errors::{Error, Result};
use crate::keys::PublicKey;
use crate::sign::Signature;
use crate::transcript::TranscriptProtocol;

/// A streaming batch verifier.
///
/// Entries are folded into one verification equation
/// `-B·Σs_i + Σk_i·P_i + ΣR_i == 0`, so a batch of `n` signatures costs one
/// `n+1`-term multiscalar multiplication instead of `n` full verifications.
///
/// [`verify`](Self::verify) is the plain sum-check used across the sr25519
/// ecosystem. A colluding set of signers can craft entries that cancel in
/// the sum; when all signatures come from untrusted parties, prefer
/// [`verify_randomized`](Self::verify_randomized), which weights each entry
/// with an independent random scalar first.
#[derive(Debug, Default)]
pub struct BatchVerifier {
    hs: Vec<Scalar>,
    pubs: Vec<RistrettoPoint>,
    ss: Vec<Scalar>,
    rs: Vec<RistrettoPoint>,
}

impl BatchVerifier {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one `(transcript, signature, public key)` entry into the
    /// batch, deriving the entry's challenge scalar exactly as single
    /// verification would.
    ///
    /// The identity public key is rejected before the transcript is
    /// touched.
    pub fn add(
        &mut self,
        t: &mut Transcript,
        signature: &Signature,
        public: &PublicKey,
    ) -> Result<()> {
        if public.is_identity() {
            return Err(Error::PublicKeyAtInfinity);
        }

        t.proto_name(b"Schnorr-sig");
        t.append_point(b"sign:pk", public.as_compressed());
        t.append_point(b"sign:R", &signature.r.compress());

        self.hs.push(t.challenge_scalar(b"sign:c"));
        self.pubs.push(*public.as_point());
        self.ss.push(signature.s);
        self.rs.push(signature.r);

        Ok(())
    }

    /// The number of entries added so far.
    pub fn len(&self) -> usize {
        self.hs.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.hs.is_empty()
    }

    /// Runs the reference sum-check over all added entries.
    #[tracing::instrument(name = "Batch-verifying signatures", skip_all, fields(entries = self.len()))]
    pub fn verify(&self) -> bool {
        let z = RistrettoPoint::vartime_multiscalar_mul(self.hs.iter(), self.pubs.iter())
            + self.rs.iter().sum::<RistrettoPoint>();
        let sb = self.ss.iter().sum::<Scalar>() * RISTRETTO_BASEPOINT_POINT;

        (-sb + z).is_identity()
    }

    /// Runs the sum-check with every entry weighted by an independent
    /// 128-bit random scalar, defeating cross-entry cancellation by
    /// colluding signers.
    pub fn verify_randomized<R>(&self, mut rng: R) -> bool
    where
        R: CryptoRng + RngCore,
    {
        // a random 128-bit scalar per entry; 128 bits suffice since the
        // weighted terms go through variable-time multiplication anyway
        let zs: Vec<Scalar> = (0..self.len())
            .map(|_| Scalar::from(rng.gen::<u128>()))
            .collect();

        // Σ z_i·s_i · B  −  Σ z_i·k_i · P_i  −  Σ z_i · R_i  == 0
        let sb: Scalar = zs.iter().zip(&self.ss).map(|(z, s)| z * s).sum();
        let scalars = core::iter::once(sb)
            .chain(zs.iter().zip(&self.hs).map(|(z, k)| -(z * k)))
            .chain(zs.iter().map(|z| -z));
        let points = core::iter::once(RISTRETTO_BASEPOINT_POINT)
            .chain(self.pubs.iter().copied())
            .chain(self.rs.iter().copied());

        RistrettoPoint::vartime_multiscalar_mul(scalars, points).is_identity()
    }
}

/// Batch-verifies parallel slices of transcripts, signatures and public
/// keys with the reference sum-check.
///
/// Fails with [`Error::BatchLengthMismatch`] when the slices disagree in
/// length, and with [`Error::PublicKeyAtInfinity`] when any public key is
/// the identity.
pub fn verify_batch(
    transcripts: &mut [Transcript],
    signatures: &[Signature],
    public_keys: &[PublicKey],
) -> Result<bool> {
    if transcripts.len() != signatures.len() || signatures.len() != public_keys.len() {
        return Err(Error::BatchLengthMismatch {
            transcripts: transcripts.len(),
            signatures: signatures.len(),
            public_keys: public_keys.len(),
        });
    }

    let mut batch = BatchVerifier::new();
    for ((t, sig), public) in transcripts.iter_mut().zip(signatures).zip(public_keys) {
        batch.add(t, sig, public)?;
    }

    Ok(batch.verify())
}
