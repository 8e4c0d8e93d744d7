use thiserror::Error;

/// Failure modes of signing, verification, derivation and key ingestion.
///
/// A signature or proof that is well formed but *wrong* is not an error:
/// verification returns `Ok(false)` for those. Errors are reserved for
/// malformed inputs and policy rejections.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A 32-byte scalar encoding was not the canonical little-endian
    /// encoding of a scalar below the group order.
    #[error("scalar bytes are not a canonical encoding")]
    InvalidScalarEncoding,

    /// 32 bytes that do not decode as a Ristretto255 element.
    #[error("point bytes are not a valid ristretto encoding")]
    InvalidPointEncoding,

    /// The identity element was supplied as a public key to a verification
    /// operation.
    #[error("public key is the point at infinity")]
    PublicKeyAtInfinity,

    /// The slices handed to batch verification disagree in length.
    #[error("batch length mismatch: {transcripts} transcripts, {signatures} signatures, {public_keys} public keys")]
    BatchLengthMismatch {
        transcripts: usize,
        signatures: usize,
        public_keys: usize,
    },

    /// Byte 63 of an encoded signature did not carry the schnorrkel
    /// marker bit.
    #[error("signature high bit missing: not a schnorrkel signature")]
    SignatureHighBitMissing,

    /// Hard derivation was requested from a public key.
    #[error("hard derivation requires a secret key")]
    NotDerivable,

    /// The operating system randomness source failed.
    #[error("failed to read from the system randomness source")]
    RandomnessFailure,

    /// An input byte string had the wrong length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// A hex string failed to decode.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,
}

impl From<hex::FromHexError> for Error {
    fn from(_: hex::FromHexError) -> Self {
        Error::InvalidHexEncoding
    }
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = core::result::Result<T, Error>;
