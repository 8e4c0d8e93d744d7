use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand_core::RngCore;

use crate::errors::{Error, Result};
use crate::keys::{MiniSecretKey, PublicKey, SecretKey, NONCE_LENGTH};
use crate::transcript::TranscriptProtocol;

/// The length in bytes of a [`ChainCode`].
pub const CHAIN_CODE_LENGTH: usize = 32;

/// 32 bytes of non-secret entropy accompanying a derivable key, keeping
/// independently derived siblings uncorrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCode(pub [u8; CHAIN_CODE_LENGTH]);

/// A key that supports hierarchical derivation: either half of a keypair.
///
/// Soft derivation works on both variants and commutes with taking the
/// public key; hard derivation is secret-only.
#[derive(Debug, Clone)]
pub enum DerivableKey {
    Secret(SecretKey),
    Public(PublicKey),
}

impl From<SecretKey> for DerivableKey {
    fn from(secret: SecretKey) -> Self {
        DerivableKey::Secret(secret)
    }
}

impl From<PublicKey> for DerivableKey {
    fn from(public: PublicKey) -> Self {
        DerivableKey::Public(public)
    }
}

impl DerivableKey {
    fn derive(&self, t: &mut Transcript, cc: ChainCode) -> Result<ExtendedKey> {
        match self {
            DerivableKey::Secret(secret) => secret.derive_key(t, cc),
            DerivableKey::Public(public) => Ok(public.derive_key(t, cc)),
        }
    }
}

/// A derived key together with the chain code under which its own children
/// are derived.
#[derive(Debug, Clone)]
pub struct ExtendedKey {
    key: DerivableKey,
    chaincode: ChainCode,
}

impl ExtendedKey {
    /// The derived key.
    pub fn key(&self) -> &DerivableKey {
        &self.key
    }

    /// The chain code for the next derivation step.
    pub fn chain_code(&self) -> ChainCode {
        self.chaincode
    }

    /// The public key of the derived key, whichever variant it holds.
    pub fn public(&self) -> Result<PublicKey> {
        match &self.key {
            DerivableKey::Secret(secret) => secret.public(),
            DerivableKey::Public(public) => Ok(*public),
        }
    }

    /// The derived secret key, if this extended key holds one.
    pub fn secret(&self) -> Option<&SecretKey> {
        match &self.key {
            DerivableKey::Secret(secret) => Some(secret),
            DerivableKey::Public(_) => None,
        }
    }

    /// Soft-derives one step further on a caller-built transcript, using
    /// the stored chain code.
    pub fn derive(&self, t: &mut Transcript) -> Result<ExtendedKey> {
        self.key.derive(t, self.chaincode)
    }
}

fn hdkd_transcript(index: &[u8]) -> Transcript {
    let mut t = Transcript::new(b"SchnorrRistrettoHDKD");
    t.append_message(b"sign-bytes", index);
    t
}

/// Soft (public-derivable) derivation of the child identified by `index`
/// under chain code `cc`.
pub fn derive_key_simple(key: &DerivableKey, index: &[u8], cc: ChainCode) -> Result<ExtendedKey> {
    let mut t = hdkd_transcript(index);
    key.derive(&mut t, cc)
}

/// Hard (secret-only) derivation of the child identified by `index` under
/// chain code `cc`.
///
/// Fails with [`Error::NotDerivable`] for the public variant: hard children
/// cannot be computed from public material.
pub fn derive_key_hard(key: &DerivableKey, index: &[u8], cc: ChainCode) -> Result<ExtendedKey> {
    match key {
        DerivableKey::Secret(secret) => {
            let mut t = hdkd_transcript(index);
            let (mini, chaincode) = secret.hard_derive_mini_secret_key(&mut t, cc);
            Ok(ExtendedKey {
                key: DerivableKey::Secret(mini.expand_ed25519()),
                chaincode,
            })
        }
        DerivableKey::Public(_) => Err(Error::NotDerivable),
    }
}

impl SecretKey {
    /// Soft-derives a child secret key on the caller's transcript: the
    /// derivation scalar is added to this key's scalar, so the child's
    /// public key equals the soft-derived public key.
    pub fn derive_key(&self, t: &mut Transcript, cc: ChainCode) -> Result<ExtendedKey> {
        let public = self.public()?;
        let (sc, chaincode) = public.derive_scalar_and_chaincode(t, cc);

        let x = self.scalar()?;
        let key = (x + sc).to_bytes();

        // child nonce: transcript-bound, keyed by the parent nonce
        let mut nonce = [0u8; NONCE_LENGTH];
        let mut witness = t.witness_rng(b"HDKD-nonce", &self.nonce(), &mut rand::thread_rng());
        witness.fill_bytes(&mut nonce);

        Ok(ExtendedKey {
            key: DerivableKey::Secret(SecretKey::new(key, nonce)),
            chaincode,
        })
    }

    /// Hard-derives a fresh mini secret key and chain code, consuming this
    /// key's scalar as transcript input. Fully deterministic.
    pub fn hard_derive_mini_secret_key(
        &self,
        t: &mut Transcript,
        cc: ChainCode,
    ) -> (MiniSecretKey, ChainCode) {
        t.append_message(b"chain-code", &cc.0);
        t.append_message(b"secret-key", &self.to_bytes());

        let mut mini = [0u8; 32];
        t.challenge_bytes(b"HDKD-hard", &mut mini);

        let mut chaincode = [0u8; CHAIN_CODE_LENGTH];
        t.challenge_bytes(b"HDKD-chaincode", &mut chaincode);

        (MiniSecretKey::from_bytes(mini), ChainCode(chaincode))
    }
}

impl PublicKey {
    /// Soft-derives a child public key on the caller's transcript:
    /// `A' = A + sc·B` for the transcript-derived scalar `sc`.
    pub fn derive_key(&self, t: &mut Transcript, cc: ChainCode) -> ExtendedKey {
        let (sc, chaincode) = self.derive_scalar_and_chaincode(t, cc);
        let point = self.as_point() + sc * RISTRETTO_BASEPOINT_POINT;
        ExtendedKey {
            key: DerivableKey::Public(PublicKey::from_point(point)),
            chaincode,
        }
    }

    /// Derives the child scalar and chain code shared by the secret and
    /// public soft-derivation paths.
    pub fn derive_scalar_and_chaincode(
        &self,
        t: &mut Transcript,
        cc: ChainCode,
    ) -> (Scalar, ChainCode) {
        t.append_message(b"chain-code", &cc.0);
        t.append_point(b"public-key", self.as_compressed());

        let sc = t.challenge_scalar(b"HDKD-scalar");

        let mut chaincode = [0u8; CHAIN_CODE_LENGTH];
        t.challenge_bytes(b"HDKD-chaincode", &mut chaincode);

        (sc, ChainCode(chaincode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use crate::transcript::signing_context;

    // test keypair from sr25519-crust's derive vectors:
    // secret scalar || nonce || public
    const VECTOR_KEYPAIR: &str =
        "4c1250e05afcd79e74f6c035aee10248841090e009b6fd7ba6a98d5dc743250c\
         afa4b32c608e3ee2ba624850b3f14c75841af84b16798bf1ee4a3875aa37a2ce\
         e661e416406384fe1ca091980958576d2bff7c461636e9f22c895f444905ea1f";

    fn vector_secret() -> SecretKey {
        let kp: [u8; 96] = crate::helpers::decode_hex(VECTOR_KEYPAIR).unwrap();
        let mut key = [0u8; 32];
        key.copy_from_slice(&kp[..32]);
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&kp[32..64]);
        SecretKey::new(key, nonce)
    }

    #[test]
    fn test_derive_soft_vector() {
        let cc = ChainCode(
            crate::helpers::decode_hex(
                "0c666f6f00000000000000000000000000000000000000000000000000000000",
            )
            .unwrap(),
        );
        let derived =
            derive_key_simple(&vector_secret().into(), &[], cc).unwrap();
        assert_eq!(
            hex::encode(derived.public().unwrap().to_bytes()),
            "b21e5aabeeb35d6a1bf76226a6c65cd897016df09ef208243e59eed2401f5357"
        );
    }

    #[test]
    fn test_derive_hard_vector() {
        let cc = ChainCode(
            crate::helpers::decode_hex(
                "14416c6963650000000000000000000000000000000000000000000000000000",
            )
            .unwrap(),
        );
        let derived = derive_key_hard(&vector_secret().into(), &[], cc).unwrap();
        assert_eq!(
            hex::encode(derived.public().unwrap().to_bytes()),
            "d8db757f04521a940f0237c8a1e44dfbe0b3e39af929eb2e9e257ba61b9a0a1a"
        );
    }

    #[test]
    fn test_derive_hard_is_deterministic() {
        let cc = ChainCode([5u8; 32]);
        let key: DerivableKey = vector_secret().into();
        let a = derive_key_hard(&key, b"//child", cc).unwrap();
        let b = derive_key_hard(&key, b"//child", cc).unwrap();
        assert_eq!(
            a.secret().unwrap().to_bytes(),
            b.secret().unwrap().to_bytes()
        );
        assert_eq!(a.secret().unwrap().nonce(), b.secret().unwrap().nonce());
        assert_eq!(a.chain_code(), b.chain_code());
    }

    #[test]
    fn test_derive_hard_from_public_fails() {
        let keypair = Keypair::generate().unwrap();
        let res = derive_key_hard(&(*keypair.public()).into(), &[], ChainCode([0u8; 32]));
        assert_eq!(res.unwrap_err(), Error::NotDerivable);
    }

    #[test]
    fn test_public_and_secret_soft_paths_agree() {
        let keypair = Keypair::generate().unwrap();
        let cc = ChainCode([7u8; 32]);

        let from_secret =
            derive_key_simple(&keypair.secret().clone().into(), b"child", cc).unwrap();
        let from_public =
            derive_key_simple(&(*keypair.public()).into(), b"child", cc).unwrap();

        assert_eq!(
            from_secret.public().unwrap(),
            from_public.public().unwrap()
        );
        assert_eq!(from_secret.chain_code(), from_public.chain_code());
    }

    #[test]
    fn test_soft_derived_secret_signs_for_derived_public() {
        let keypair = Keypair::generate().unwrap();
        let cc = ChainCode([1u8; 32]);

        let child_secret =
            derive_key_simple(&keypair.secret().clone().into(), b"child", cc).unwrap();
        let child_public =
            derive_key_simple(&(*keypair.public()).into(), b"child", cc).unwrap();

        let mut signing = signing_context(b"test", b"signme");
        let sig = child_secret.secret().unwrap().sign(&mut signing).unwrap();

        let mut verifying = signing_context(b"test", b"signme");
        assert!(child_public
            .public()
            .unwrap()
            .verify(&sig, &mut verifying)
            .unwrap());
    }

    #[test]
    fn test_extended_key_chains_derivations() {
        let keypair = Keypair::generate().unwrap();
        let cc = ChainCode([2u8; 32]);

        let child =
            derive_key_simple(&keypair.secret().clone().into(), b"one", cc).unwrap();
        let grandchild = child.derive(&mut hdkd_transcript(b"two")).unwrap();

        // the grandchild's public must be reachable over the public path
        let child_pub = derive_key_simple(&(*keypair.public()).into(), b"one", cc).unwrap();
        let grandchild_pub = child_pub.derive(&mut hdkd_transcript(b"two")).unwrap();

        assert_eq!(
            grandchild.public().unwrap(),
            grandchild_pub.public().unwrap()
        );
    }

    #[test]
    fn test_different_indices_produce_different_children() {
        let keypair = Keypair::generate().unwrap();
        let cc = ChainCode([3u8; 32]);
        let key: DerivableKey = keypair.secret().clone().into();

        let a = derive_key_simple(&key, b"a", cc).unwrap();
        let b = derive_key_simple(&key, b"b", cc).unwrap();
        assert_ne!(a.public().unwrap(), b.public().unwrap());
        assert_ne!(a.chain_code(), b.chain_code());
    }
}
