use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use merlin::Transcript;
use rand_core::{CryptoRng, OsRng, RngCore};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::errors::{Error, Result};
use crate::helpers::decode_hex;
use crate::scalars::{divide_scalar_bytes_by_cofactor, scalar_from_canonical_bytes};

/// The length in bytes of a [`MiniSecretKey`].
pub const MINI_SECRET_KEY_LENGTH: usize = 32;

/// The length in bytes of the scalar half of a [`SecretKey`].
pub const SECRET_KEY_LENGTH: usize = 32;

/// The length in bytes of a [`SecretKey`] signing nonce.
pub const NONCE_LENGTH: usize = 32;

/// The length in bytes of a compressed [`PublicKey`].
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// A 32-byte seed from which a full signing key is expanded.
///
/// This is the form in which sr25519 keys are exported and imported; the
/// expansion to a [`SecretKey`] is deterministic.
pub struct MiniSecretKey {
    key: Secret<[u8; MINI_SECRET_KEY_LENGTH]>,
}

impl core::fmt::Debug for MiniSecretKey {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        // never print the seed
        fmt.debug_struct("MiniSecretKey").finish_non_exhaustive()
    }
}

impl Clone for MiniSecretKey {
    fn clone(&self) -> Self {
        MiniSecretKey {
            key: Secret::new(*self.key.expose_secret()),
        }
    }
}

impl MiniSecretKey {
    /// Generates a mini secret key from the operating system CSPRNG.
    pub fn generate() -> Result<Self> {
        Self::generate_with(OsRng)
    }

    /// Generates a mini secret key from the supplied CSPRNG.
    pub fn generate_with<R>(mut rng: R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        let mut key = [0u8; MINI_SECRET_KEY_LENGTH];
        rng.try_fill_bytes(&mut key)
            .map_err(|_| Error::RandomnessFailure)?;
        Ok(MiniSecretKey {
            key: Secret::new(key),
        })
    }

    /// Wraps raw little-endian seed bytes.
    pub fn from_bytes(key: [u8; MINI_SECRET_KEY_LENGTH]) -> Self {
        MiniSecretKey {
            key: Secret::new(key),
        }
    }

    /// Reduces 64 uniform bytes to a scalar and stores its canonical
    /// encoding as the seed.
    pub fn from_uniform_bytes(bytes: &[u8; 64]) -> Self {
        let key = Scalar::from_bytes_mod_order_wide(bytes).to_bytes();
        MiniSecretKey {
            key: Secret::new(key),
        }
    }

    /// Takes the first 32 bytes of a 64-byte PBKDF2-SHA512 seed, the
    /// substrate BIP-39 convention. Mnemonic handling happens upstream;
    /// this crate only consumes the finished seed.
    pub fn from_seed(seed: &[u8; 64]) -> Self {
        let mut key = [0u8; MINI_SECRET_KEY_LENGTH];
        key.copy_from_slice(&seed[..MINI_SECRET_KEY_LENGTH]);
        MiniSecretKey {
            key: Secret::new(key),
        }
    }

    /// Parses a hex-encoded seed, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(Self::from_bytes(decode_hex(s)?))
    }

    /// Returns the underlying seed bytes.
    pub fn to_bytes(&self) -> [u8; MINI_SECRET_KEY_LENGTH] {
        *self.key.expose_secret()
    }

    /// Expands the seed into a signing key the way `ed25519-dalek` expands
    /// its secret keys: SHA-512, clamp, then divide the clamped scalar by
    /// the cofactor so it lands in the prime-order group.
    pub fn expand_ed25519(&self) -> SecretKey {
        let h: [u8; 64] = Sha512::digest(self.key.expose_secret()).into();

        let mut key = [0u8; SECRET_KEY_LENGTH];
        key.copy_from_slice(&h[..32]);
        key[0] &= 248;
        key[31] &= 63;
        key[31] |= 64;
        divide_scalar_bytes_by_cofactor(&mut key);

        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&h[32..]);

        SecretKey::new(key, nonce)
    }

    /// Expands the seed through a dedicated transcript, yielding a
    /// uniformly distributed secret scalar instead of a clamped one.
    pub fn expand_uniform(&self) -> SecretKey {
        let mut t = Transcript::new(b"ExpandSecretKeys");
        t.append_message(b"mini", self.key.expose_secret());

        let mut scalar_bytes = [0u8; 64];
        t.challenge_bytes(b"sk", &mut scalar_bytes);
        let key = Scalar::from_bytes_mod_order_wide(&scalar_bytes).to_bytes();

        let mut nonce = [0u8; NONCE_LENGTH];
        t.challenge_bytes(b"no", &mut nonce);

        SecretKey::new(key, nonce)
    }

    /// Returns the public key of the `expand_ed25519` expansion.
    pub fn public(&self) -> PublicKey {
        let expanded = self.expand_ed25519();
        // the cofactor division leaves the scalar below 2^252, so its
        // encoding is always canonical
        let key = Scalar::from_bytes_mod_order(*expanded.key.expose_secret());
        PublicKey::from_point(key * RISTRETTO_BASEPOINT_POINT)
    }
}

/// An expanded signing key: a secret scalar and the nonce seed mixed into
/// every signature's witness.
pub struct SecretKey {
    key: Secret<[u8; SECRET_KEY_LENGTH]>,
    nonce: [u8; NONCE_LENGTH],
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        // neither the scalar nor the nonce may appear in logs
        fmt.debug_struct("SecretKey").finish_non_exhaustive()
    }
}

impl Clone for SecretKey {
    fn clone(&self) -> Self {
        SecretKey {
            key: Secret::new(*self.key.expose_secret()),
            nonce: self.nonce,
        }
    }
}

impl SecretKey {
    /// Assembles a secret key from a canonical scalar encoding and a nonce.
    ///
    /// The scalar encoding is not validated here; operations that need the
    /// scalar fail with [`Error::InvalidScalarEncoding`] if it is not
    /// canonical.
    pub fn new(key: [u8; SECRET_KEY_LENGTH], nonce: [u8; NONCE_LENGTH]) -> Self {
        SecretKey {
            key: Secret::new(key),
            nonce,
        }
    }

    /// Ingests the 64-byte `ed25519` expanded secret key form: a clamped
    /// scalar followed by the nonce. The scalar is divided by the cofactor
    /// to preserve bit-compatibility with ed25519-derived schnorrkel keys.
    pub fn from_ed25519_bytes(bytes: &[u8; 64]) -> Self {
        let mut key = [0u8; SECRET_KEY_LENGTH];
        key.copy_from_slice(&bytes[..32]);
        divide_scalar_bytes_by_cofactor(&mut key);

        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&bytes[32..]);

        SecretKey::new(key, nonce)
    }

    /// Returns the canonical encoding of the secret scalar.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        *self.key.expose_secret()
    }

    /// Returns the signing nonce.
    pub fn nonce(&self) -> [u8; NONCE_LENGTH] {
        self.nonce
    }

    pub(crate) fn scalar(&self) -> Result<Scalar> {
        scalar_from_canonical_bytes(*self.key.expose_secret())
    }

    /// Computes the public counterpart `x·B`.
    pub fn public(&self) -> Result<PublicKey> {
        let x = self.scalar()?;
        Ok(PublicKey::from_point(x * RISTRETTO_BASEPOINT_POINT))
    }

    /// Bundles this key with its public counterpart.
    pub fn keypair(self) -> Result<Keypair> {
        let public = self.public()?;
        Ok(Keypair {
            public,
            secret: self,
        })
    }
}

/// A Ristretto255 element with its compressed encoding cached eagerly, so
/// concurrent readers never observe partially initialized state.
#[derive(Clone, Copy)]
pub struct PublicKey {
    point: RistrettoPoint,
    compressed: CompressedRistretto,
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(fmt, "PublicKey({})", hex::encode(self.compressed.as_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(
            self.compressed
                .as_bytes()
                .ct_eq(other.compressed.as_bytes()),
        )
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    pub(crate) fn from_point(point: RistrettoPoint) -> Self {
        PublicKey {
            point,
            compressed: point.compress(),
        }
    }

    /// Decodes a compressed Ristretto encoding.
    ///
    /// The identity element decodes successfully; it is rejected at
    /// verification time, not here.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Result<Self> {
        let compressed = CompressedRistretto(bytes);
        let point = compressed
            .decompress()
            .ok_or(Error::InvalidPointEncoding)?;
        Ok(PublicKey { point, compressed })
    }

    /// Parses a hex-encoded public key, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(decode_hex(s)?)
    }

    /// Returns the canonical compressed encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.compressed.to_bytes()
    }

    pub(crate) fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }

    pub(crate) fn as_compressed(&self) -> &CompressedRistretto {
        &self.compressed
    }

    /// Whether this is the point at infinity, i.e. the public key of the
    /// zero scalar.
    pub fn is_identity(&self) -> bool {
        self.point.is_identity()
    }
}

/// A matched public/secret key pair.
#[derive(Debug, Clone)]
pub struct Keypair {
    public: PublicKey,
    secret: SecretKey,
}

impl Keypair {
    /// Bundles an already-matched public and secret key.
    pub fn new(public: PublicKey, secret: SecretKey) -> Self {
        Keypair { public, secret }
    }

    /// Generates a fresh keypair from the operating system CSPRNG using the
    /// `ed25519`-style expansion.
    pub fn generate() -> Result<Self> {
        Self::generate_with(OsRng)
    }

    /// Generates a fresh keypair from the supplied CSPRNG.
    pub fn generate_with<R>(rng: R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        let mini = MiniSecretKey::generate_with(rng)?;
        Ok(Keypair {
            public: mini.public(),
            secret: mini.expand_ed25519(),
        })
    }

    /// The public half.
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// The secret half.
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair_public_matches_secret() {
        let keypair = Keypair::generate().unwrap();
        let pub2 = keypair.secret().public().unwrap();
        assert_eq!(*keypair.public(), pub2);
    }

    // vectors from sr25519-crust's keypair_from_seed tests
    #[test]
    fn test_expand_ed25519_zero_seed() {
        let msc = MiniSecretKey::from_bytes([0u8; 32]);
        let sk = msc.expand_ed25519();

        let expected = hex::decode(
            "caa835781b15c7706f65b71f7a58c807ab360faed6440fb23e0f4c52e930de0a\
             0a6a85eaa642dac835424b5d7c8d637c00408c7a73da672b7f498521420b6dd3\
             def12e42f3e487e9b14095aa8d5cc16a33491f1b50dadcf8811d1480f3fa8627",
        )
        .unwrap();

        assert_eq!(sk.to_bytes()[..], expected[..32]);
        assert_eq!(sk.nonce()[..], expected[32..64]);
        assert_eq!(msc.public().to_bytes()[..], expected[64..]);
    }

    #[test]
    fn test_expand_ed25519_counting_seed() {
        let raw = [
            1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2,
            3, 4, 5, 6, 7, 8, 9, 0, 1, 2,
        ];
        let msc = MiniSecretKey::from_bytes(raw);
        let sk = msc.expand_ed25519();

        let expected_key = [
            11, 241, 180, 83, 213, 181, 31, 180, 138, 45, 144, 84, 2, 78, 47,
            81, 225, 208, 202, 53, 128, 52, 89, 144, 36, 92, 197, 51, 166, 28,
            152, 10,
        ];
        let expected_nonce = [
            69, 121, 245, 84, 53, 88, 241, 101, 252, 126, 198, 17, 237, 114,
            215, 135, 224, 58, 4, 75, 134, 169, 226, 109, 76, 133, 25, 135,
            115, 81, 176, 46,
        ];
        let expected_public = [
            140, 122, 228, 195, 50, 29, 229, 250, 94, 159, 183, 123, 208, 116,
            7, 78, 229, 29, 247, 64, 172, 187, 92, 144, 121, 56, 242, 3, 116,
            99, 100, 32,
        ];

        assert_eq!(sk.to_bytes(), expected_key);
        assert_eq!(sk.nonce(), expected_nonce);
        assert_eq!(msc.public().to_bytes(), expected_public);
    }

    // the substrate dev key //Alice
    #[test]
    fn test_alice_dev_public_key() {
        let msc = MiniSecretKey::from_hex(
            "0xe5be9a5092b81bca64be81d212e7f2f9eba183bb7a90954f7b76361f6edb5c0a",
        )
        .unwrap();
        assert_eq!(
            hex::encode(msc.public().to_bytes()),
            "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"
        );
    }

    #[test]
    fn test_secret_key_public_vector() {
        let key: [u8; 32] = crate::helpers::decode_hex(
            "05d65584630d16cd4af6d0bec10f34bb504a5dcb62dba2122d49f5a663763d0a",
        )
        .unwrap();
        let sk = SecretKey::new(key, [0u8; 32]);
        let public = sk.public().unwrap();

        let expected = PublicKey::from_hex(
            "46ebddef8cd9bb167dc30878d7113b7e168e6f0646beffd77d69d39bad76b47a",
        )
        .unwrap();
        assert_eq!(public, expected);
    }

    #[test]
    fn test_from_ed25519_bytes_matches_expansion() {
        let msc = MiniSecretKey::from_bytes([7u8; 32]);
        let h: [u8; 64] = Sha512::digest(msc.to_bytes()).into();

        let mut ed = [0u8; 64];
        ed.copy_from_slice(&h);
        ed[0] &= 248;
        ed[31] &= 63;
        ed[31] |= 64;

        let sk = SecretKey::from_ed25519_bytes(&ed);
        let expanded = msc.expand_ed25519();
        assert_eq!(sk.to_bytes(), expanded.to_bytes());
        assert_eq!(sk.nonce(), expanded.nonce());
    }

    #[test]
    fn test_expand_uniform_public_consistency() {
        let msc = MiniSecretKey::from_bytes([42u8; 32]);
        let sk = msc.expand_uniform();
        // the stored key is a reduced scalar, so it must round-trip
        // canonically and produce a decodable public key
        let public = sk.public().unwrap();
        let recovered = PublicKey::from_bytes(public.to_bytes()).unwrap();
        assert_eq!(public, recovered);
    }

    #[test]
    fn test_expand_uniform_differs_from_ed25519() {
        let msc = MiniSecretKey::from_bytes([42u8; 32]);
        assert_ne!(
            msc.expand_uniform().to_bytes(),
            msc.expand_ed25519().to_bytes()
        );
    }

    // substrate BIP-39 vector: mnemonic "legal winner thank year wave
    // sausage worth useful legal winner thank yellow", password "Substrate"
    #[test]
    fn test_mini_secret_from_substrate_seed() {
        let seed: [u8; 64] = crate::helpers::decode_hex(
            "4313249608fe8ac10fd5886c92c4579007272cb77c21551ee5b8d60b78041685\
             0f1e26c1f4b8d88ece681cb058ab66d6182bc2ce5a03181f7b74c27576b5c8bf",
        )
        .unwrap();
        let msc = MiniSecretKey::from_seed(&seed);
        assert_eq!(msc.to_bytes()[..], seed[..32]);
    }

    #[test]
    fn test_public_key_decode_rejects_garbage() {
        let res = PublicKey::from_bytes([0xff; 32]);
        assert_eq!(res.unwrap_err(), Error::InvalidPointEncoding);
    }

    #[test]
    fn test_identity_public_key_decodes() {
        let identity = PublicKey::from_bytes([0u8; 32]).unwrap();
        assert!(identity.is_identity());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let msc = MiniSecretKey::from_bytes([3u8; 32]);
        let sk = msc.expand_ed25519();
        assert_eq!(format!("{:?}", msc), "MiniSecretKey { .. }");
        assert_eq!(format!("{:?}", sk), "SecretKey { .. }");
    }
}
