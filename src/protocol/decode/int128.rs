//! INT128 wire pairing.
//!
//! Firebird hands a 128-bit integer over as two native 64-bit words: `low`
//! carries bits 0..63 and `high` carries bits 64..127 of the two's-complement
//! value. The sign therefore lives in `high` alone.

use num_bigint::{BigInt, BigUint, Sign};
use std::fmt;

/// A 128-bit signed integer as the two words exchanged with the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Int128 {
    /// Bits 0..63.
    pub low: i64,
    /// Bits 64..127, sign included.
    pub high: i64,
}

impl Int128 {
    /// Create from the two wire words.
    pub const fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    /// Sign-extend a 64-bit value.
    pub const fn from_i64(value: i64) -> Self {
        Self {
            low: value,
            high: if value < 0 { -1 } else { 0 },
        }
    }

    /// Split a native `i128`.
    pub const fn from_i128(value: i128) -> Self {
        Self {
            low: value as i64,
            high: (value >> 64) as i64,
        }
    }

    /// Join into a native `i128`.
    pub const fn to_i128(self) -> i128 {
        ((self.high as i128) << 64) | (self.low as u64 as i128)
    }

    /// Native-endian buffer bytes, low word first.
    pub fn to_ne_words(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.low.to_ne_bytes());
        out[8..].copy_from_slice(&self.high.to_ne_bytes());
        out
    }

    /// Inverse of [`Int128::to_ne_words`].
    pub fn from_ne_words(bytes: [u8; 16]) -> Self {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&bytes[..8]);
        high.copy_from_slice(&bytes[8..]);
        Self {
            low: i64::from_ne_bytes(low),
            high: i64::from_ne_bytes(high),
        }
    }
}

impl From<i64> for Int128 {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<i128> for Int128 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl From<Int128> for i128 {
    fn from(value: Int128) -> Self {
        value.to_i128()
    }
}

impl fmt::Display for Int128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i128())
    }
}

/// Rebuild an arbitrary-precision integer from the wire words.
pub fn recompose(value: Int128) -> BigInt {
    let sign = match value.high {
        0 if value.low == 0 => Sign::NoSign,
        0 => Sign::Plus,
        h if h > 0 => Sign::Plus,
        _ => Sign::Minus,
    };
    let magnitude = value.to_i128().unsigned_abs();
    BigInt::from_biguint(sign, BigUint::from(magnitude))
}

/// Split an arbitrary-precision integer into the wire words.
///
/// Values outside the INT128 range wrap modulo 2^128.
pub fn decompose(value: &BigInt) -> Int128 {
    let (sign, words) = value.to_u64_digits();
    let low = words.first().copied().unwrap_or(0);
    let high = words.get(1).copied().unwrap_or(0);
    let magnitude = ((high as u128) << 64) | low as u128;
    let bits = if sign == Sign::Minus {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    Int128 {
        low: bits as u64 as i64,
        high: (bits >> 64) as u64 as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompose_vectors() {
        assert_eq!(recompose(Int128::new(0, 0)), BigInt::from(0));
        assert_eq!(recompose(Int128::new(i64::MIN, -1)), BigInt::from(i64::MIN));
        assert_eq!(recompose(Int128::new(-1, -1)), BigInt::from(-1));
        assert_eq!(recompose(Int128::new(i64::MAX, 0)), BigInt::from(i64::MAX));
        assert_eq!(
            recompose(Int128::new(-1, 0)),
            BigInt::from(u64::MAX)
        );
    }

    #[test]
    fn test_decompose_vectors() {
        assert_eq!(decompose(&BigInt::from(-1)), Int128::new(-1, -1));
        assert_eq!(decompose(&BigInt::from(i64::MAX)), Int128::new(i64::MAX, 0));
        assert_eq!(decompose(&BigInt::from(i64::MIN)), Int128::new(i64::MIN, -1));
        assert_eq!(decompose(&BigInt::from(0)), Int128::new(0, 0));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(recompose(Int128::from_i128(i128::MAX)), BigInt::from(i128::MAX));
        assert_eq!(recompose(Int128::from_i128(i128::MIN)), BigInt::from(i128::MIN));
        assert_eq!(decompose(&BigInt::from(i128::MIN)), Int128::new(0, i64::MIN));
    }

    #[test]
    fn test_round_trip_word_pairs() {
        let words = [0, 1, -1, 2, -2, i64::MIN, i64::MAX, i64::MIN + 1, 0x5555_5555_5555_5555];
        for &low in &words {
            for &high in &words {
                let pair = Int128::new(low, high);
                assert_eq!(decompose(&recompose(pair)), pair, "({low}, {high})");
            }
        }
    }

    #[test]
    fn test_out_of_range_wraps() {
        let two_pow_128 = BigInt::from(1) << 128;
        assert_eq!(decompose(&two_pow_128), Int128::new(0, 0));
        assert_eq!(decompose(&(two_pow_128 + 5)), Int128::new(5, 0));
    }

    #[test]
    fn test_native_words() {
        let v = Int128::from_i128(-123_456_789_012_345_678_901_234_567_890);
        assert_eq!(Int128::from_ne_words(v.to_ne_words()), v);
        assert_eq!(Int128::from(-7i64).to_i128(), -7);
        assert_eq!(Int128::from(42i64).to_string(), "42");
    }
}
