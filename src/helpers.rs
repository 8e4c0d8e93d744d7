use crate::errors::{Error, Result};

/// Decodes a hex string, with or without a `0x` prefix, into exactly `N`
/// bytes.
pub(crate) fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(s)?;
    if raw.len() != N {
        return Err(Error::InvalidLength {
            expected: N,
            got: raw.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&raw);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_with_and_without_prefix() {
        let a: [u8; 2] = decode_hex("0xbeef").unwrap();
        let b: [u8; 2] = decode_hex("beef").unwrap();
        assert_eq!(a, [0xbe, 0xef]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_hex_wrong_length() {
        let res = decode_hex::<4>("beef");
        assert_eq!(res, Err(Error::InvalidLength { expected: 4, got: 2 }));
    }

    #[test]
    fn test_decode_hex_bad_digit() {
        let res = decode_hex::<2>("zzzz");
        assert_eq!(res, Err(Error::InvalidHexEncoding));
    }
}
