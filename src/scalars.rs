use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use crate::errors::{Error, Result};

/// Divides a 256-bit little-endian integer by the curve cofactor 8.
///
/// This is a literal right-shift by three bits with carry propagation from
/// the most-significant byte downward, not a field inversion: ed25519
/// clamping zeroes the low three bits, so the shift is exact and the result
/// lands in the prime-order scalar range.
pub(crate) fn divide_scalar_bytes_by_cofactor(scalar: &mut [u8; 32]) {
    let mut low = 0u8;
    for b in scalar.iter_mut().rev() {
        let r = *b & 0b0000_0111;
        *b >>= 3;
        *b += low;
        low = r << 5;
    }
}

/// Decodes 32 bytes as a canonical scalar, rejecting encodings at or above
/// the group order.
pub(crate) fn scalar_from_canonical_bytes(bytes: [u8; 32]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
        .ok_or(Error::InvalidScalarEncoding)
}

/// Samples a uniformly random scalar from the given CSPRNG.
pub(crate) fn random_scalar<R: CryptoRng + RngCore>(mut rng: R) -> Scalar {
    Scalar::random(&mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn test_divide_by_cofactor_small_values() {
        // 64 / 8 = 8
        let mut bytes = [0u8; 32];
        bytes[0] = 64;
        divide_scalar_bytes_by_cofactor(&mut bytes);
        assert_eq!(bytes[0], 8);
        assert!(bytes[1..].iter().all(|b| *b == 0));

        // carry across a byte boundary: 0x0100 / 8 = 0x20
        let mut bytes = [0u8; 32];
        bytes[1] = 1;
        divide_scalar_bytes_by_cofactor(&mut bytes);
        assert_eq!(bytes[0], 0x20);
        assert_eq!(bytes[1], 0);
    }

    #[test]
    fn test_canonical_roundtrip() {
        let sc = random_scalar(OsRng);
        let decoded = scalar_from_canonical_bytes(sc.to_bytes()).unwrap();
        assert_eq!(sc, decoded);
    }

    #[test]
    fn test_non_canonical_rejected() {
        // the group order itself is the smallest non-canonical encoding
        let order: [u8; 32] = [
            0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7,
            0xa2, 0xde, 0xf9, 0xde, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
        ];
        assert_eq!(
            scalar_from_canonical_bytes(order),
            Err(Error::InvalidScalarEncoding)
        );
    }
}
