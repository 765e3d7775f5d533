// Path: crates/candid/src/leb128.rs
//! LEB128 varints.
//!
//! Unsigned values carry 7 data bits per byte, least significant group
//! first, with the high bit set on every byte but the last. Signed values
//! use the same layout over the two's-complement form, with bit 6 of the
//! final byte acting as the sign.

use crate::Result;
use ica_types::error::CandidError;
use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};

/// Fixed-width reads accept at most this many bytes (70 payload bits),
/// which leaves room for a redundant padding byte on a 64-bit value.
const MAX_FIXED_LEN: usize = 10;

fn underrun() -> CandidError {
    CandidError::Encoding("leb128: buffer exhausted before terminating byte".into())
}

/// Appends the ULEB128 form of `n`.
pub fn write_unsigned(mut n: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends the SLEB128 form of `n`.
pub fn write_signed(mut n: i64, out: &mut Vec<u8>) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        let done = (n == 0 && byte & 0x40 == 0) || (n == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// ULEB128 of `n` as a fresh buffer.
pub fn encode_unsigned(n: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_FIXED_LEN);
    write_unsigned(n, &mut out);
    out
}

/// SLEB128 of `n` as a fresh buffer.
pub fn encode_signed(n: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_FIXED_LEN);
    write_signed(n, &mut out);
    out
}

/// Appends the ULEB128 form of an arbitrary-precision natural.
pub fn write_nat(n: &BigUint, out: &mut Vec<u8>) {
    let mut n = n.clone();
    loop {
        let low = n.iter_u32_digits().next().unwrap_or(0);
        let byte = (low & 0x7f) as u8;
        n >>= 7u32;
        if n.is_zero() {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends the SLEB128 form of an arbitrary-precision integer.
pub fn write_int(n: &BigInt, out: &mut Vec<u8>) {
    let mask = BigInt::from(0x7f);
    let minus_one = BigInt::from(-1);
    let mut n = n.clone();
    loop {
        // Two's-complement masking keeps this in 0..=127 for negative `n`.
        let byte = (&n & &mask).to_u8().unwrap_or(0);
        // Arithmetic shift: rounds toward negative infinity.
        n >>= 7u32;
        let done = (n.is_zero() && byte & 0x40 == 0) || (n == minus_one && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Decodes a ULEB128 value starting at `offset`, returning the value and
/// the number of bytes consumed.
pub fn decode_unsigned(bytes: &[u8], offset: usize) -> Result<(u64, usize)> {
    decode_bounded(bytes, offset, 64)
}

/// Decodes a ULEB128 value that must fit in `bits` (at most 64) bits.
/// Oversized values fail with [`CandidError::Range`].
pub fn decode_bounded(bytes: &[u8], offset: usize, bits: u32) -> Result<(u64, usize)> {
    let input = bytes.get(offset..).ok_or_else(underrun)?;
    let mut acc: u128 = 0;
    for (i, byte) in input.iter().enumerate() {
        if i >= MAX_FIXED_LEN {
            return Err(CandidError::Range(format!(
                "leb128: more than {MAX_FIXED_LEN} bytes for a {bits}-bit value"
            )));
        }
        acc |= u128::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            if bits < 128 && acc >> bits != 0 {
                return Err(CandidError::Range(format!(
                    "leb128: {acc} does not fit in {bits} bits"
                )));
            }
            let value = u64::try_from(acc)
                .map_err(|_| CandidError::Range(format!("leb128: {acc} exceeds 64 bits")))?;
            return Ok((value, i + 1));
        }
    }
    Err(underrun())
}

/// Decodes a SLEB128 value starting at `offset`.
pub fn decode_signed(bytes: &[u8], offset: usize) -> Result<(i64, usize)> {
    decode_signed_bounded(bytes, offset, 64)
}

/// Decodes a SLEB128 value that must fit in a signed `bits`-bit integer.
pub fn decode_signed_bounded(bytes: &[u8], offset: usize, bits: u32) -> Result<(i64, usize)> {
    let input = bytes.get(offset..).ok_or_else(underrun)?;
    let mut acc: i128 = 0;
    for (i, byte) in input.iter().enumerate() {
        if i >= MAX_FIXED_LEN {
            return Err(CandidError::Range(format!(
                "sleb128: more than {MAX_FIXED_LEN} bytes for a {bits}-bit value"
            )));
        }
        let shift = 7 * i;
        acc |= i128::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            if byte & 0x40 != 0 {
                acc |= -1i128 << (shift + 7);
            }
            let half = 1i128 << (bits.min(64) - 1);
            if acc < -half || acc >= half {
                return Err(CandidError::Range(format!(
                    "sleb128: {acc} does not fit in {bits} bits"
                )));
            }
            let value = i64::try_from(acc)
                .map_err(|_| CandidError::Range(format!("sleb128: {acc} exceeds 64 bits")))?;
            return Ok((value, i + 1));
        }
    }
    Err(underrun())
}

/// Decodes an arbitrary-precision ULEB128 natural.
pub fn decode_nat(bytes: &[u8], offset: usize) -> Result<(BigUint, usize)> {
    let input = bytes.get(offset..).ok_or_else(underrun)?;
    let mut acc = BigUint::zero();
    let mut shift = 0usize;
    for (i, byte) in input.iter().enumerate() {
        acc |= BigUint::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((acc, i + 1));
        }
        shift += 7;
    }
    Err(underrun())
}

/// Decodes an arbitrary-precision SLEB128 integer.
pub fn decode_int(bytes: &[u8], offset: usize) -> Result<(BigInt, usize)> {
    let input = bytes.get(offset..).ok_or_else(underrun)?;
    let mut acc = BigInt::zero();
    let mut shift = 0usize;
    for (i, byte) in input.iter().enumerate() {
        acc |= BigInt::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte & 0x40 != 0 {
                acc -= BigInt::from(1) << shift;
            }
            return Ok((acc, i + 1));
        }
    }
    Err(underrun())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_is_one_byte() {
        assert_eq!(encode_unsigned(0), vec![0x00]);
        assert_eq!(decode_unsigned(&[0x00], 0).unwrap(), (0, 1));
        assert_eq!(encode_signed(0), vec![0x00]);
    }

    #[test]
    fn test_width_boundaries() {
        assert_eq!(encode_unsigned(127).len(), 1);
        assert_eq!(encode_unsigned(128).len(), 2);
        assert_eq!(encode_unsigned(624_485), vec![0xe5, 0x8e, 0x26]);
        assert_eq!(encode_signed(-123_456), vec![0xc0, 0xbb, 0x78]);
        assert_eq!(encode_signed(63), vec![0x3f]);
        assert_eq!(encode_signed(64), vec![0xc0, 0x00]);
        assert_eq!(encode_signed(-1), vec![0x7f]);
    }

    #[test]
    fn test_decode_at_offset() {
        let bytes = [0xff, 0xe5, 0x8e, 0x26, 0x01];
        assert_eq!(decode_unsigned(&bytes, 1).unwrap(), (624_485, 3));
    }

    #[test]
    fn test_truncated_input_is_encoding_error() {
        assert!(matches!(
            decode_unsigned(&[0x80, 0x80], 0),
            Err(CandidError::Encoding(_))
        ));
        assert!(matches!(decode_nat(&[], 0), Err(CandidError::Encoding(_))));
        assert!(matches!(decode_int(&[0xff], 0), Err(CandidError::Encoding(_))));
    }

    #[test]
    fn test_bounded_decode_rejects_overflow() {
        let bytes = encode_unsigned(u64::from(u32::MAX) + 1);
        assert!(matches!(
            decode_bounded(&bytes, 0, 32),
            Err(CandidError::Range(_))
        ));
        assert_eq!(
            decode_bounded(&encode_unsigned(u64::from(u32::MAX)), 0, 32).unwrap().0,
            u64::from(u32::MAX)
        );
        let too_long = [0x80u8; 11];
        assert!(matches!(
            decode_unsigned(&too_long, 0),
            Err(CandidError::Range(_))
        ));
    }

    #[test]
    fn test_signed_bounded_decode_rejects_overflow() {
        let bytes = encode_signed(i64::from(i32::MIN) - 1);
        assert!(matches!(
            decode_signed_bounded(&bytes, 0, 32),
            Err(CandidError::Range(_))
        ));
    }

    #[test]
    fn test_bignum_beyond_u64() {
        let big = BigUint::from(u64::MAX) * BigUint::from(1_000u32);
        let mut out = Vec::new();
        write_nat(&big, &mut out);
        assert_eq!(decode_nat(&out, 0).unwrap(), (big, out.len()));

        let neg = -(BigInt::from(u64::MAX) << 8usize);
        let mut out = Vec::new();
        write_int(&neg, &mut out);
        assert_eq!(decode_int(&out, 0).unwrap(), (neg, out.len()));
    }

    proptest! {
        #[test]
        fn prop_unsigned_roundtrip(n in any::<u64>()) {
            let bytes = encode_unsigned(n);
            prop_assert_eq!(decode_unsigned(&bytes, 0).unwrap(), (n, bytes.len()));
            let mut big = Vec::new();
            write_nat(&BigUint::from(n), &mut big);
            prop_assert_eq!(big, bytes);
        }

        #[test]
        fn prop_signed_roundtrip(n in any::<i64>()) {
            let bytes = encode_signed(n);
            prop_assert_eq!(decode_signed(&bytes, 0).unwrap(), (n, bytes.len()));
            let mut big = Vec::new();
            write_int(&BigInt::from(n), &mut big);
            prop_assert_eq!(&big, &bytes);
            prop_assert_eq!(decode_int(&bytes, 0).unwrap(), (BigInt::from(n), bytes.len()));
        }
    }
}
