//! The raw big-integer carrier.
//!
//! The host language (Rust) has no built-in arbitrary-width integer, so this
//! module supplies a thin wrapper over [`num_bigint::BigUint`]; the hot path
//! for a leaf field is nothing more than a handful of `BigUint` shift/mask
//! calls. [`Raw`] is a type alias rather than a newtype: `BigUint` already
//! has exactly the shape the spec wants (non-negative, unbounded width,
//! shift/and/or/bit-length), so wrapping it again would just be
//! indirection for its own sake.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// An unbounded-width, non-negative integer: the carrier that every
/// interface is ultimately bound to.
pub type Raw = BigUint;

/// `(1 << width) - 1`, the mask selecting exactly `width` low-order bits.
pub fn mask(width: u64) -> BigUint {
    (BigUint::one() << width as usize) - BigUint::one()
}

/// `(1 << width)`, one past the largest value representable in `width` bits.
pub fn capacity(width: u64) -> BigUint {
    BigUint::one() << width as usize
}

/// Extract the `width`-bit window starting at bit `offset`: `(raw >> offset) & mask(width)`.
pub fn shift_and(raw: &BigUint, offset: u64, width: u64) -> BigUint {
    if width == 0 {
        return BigUint::zero();
    }
    (raw >> offset as usize) & mask(width)
}

/// Replace the `width`-bit window starting at bit `offset` with `new_value`,
/// leaving every other bit of `raw` untouched. `new_value` is assumed to
/// already fit within `width` bits; callers validate that before calling.
///
/// `BigUint` has no fixed bit width to bitwise-not against, so rather than
/// `(raw & !(mask << offset)) | (new << offset)` we subtract out the
/// current window and add the new one back in. Equivalent for a
/// non-negative unbounded integer, and avoids fabricating a complement.
pub fn set_window(raw: &BigUint, offset: u64, width: u64, new_value: &BigUint) -> BigUint {
    let current_window = shift_and(raw, offset, width);
    let cleared = raw - (current_window << offset as usize);
    cleared + (new_value << offset as usize)
}

/// Assemble a [`Raw`] from a little-endian sequence of fixed-width words, as
/// a stream of e.g. 32- or 64-bit words would be converted by a caller via
/// repeated shift-add.
pub fn from_words_le(words: &[u64], word_width: u32) -> BigUint {
    let mut acc = BigUint::zero();
    for (i, word) in words.iter().enumerate() {
        acc += BigUint::from(*word) << (i * word_width as usize);
    }
    acc
}

/// Split a [`Raw`] of `total_width` bits into a little-endian sequence of
/// `word_width`-bit words, the inverse of [`from_words_le`].
pub fn into_words_le(raw: &BigUint, total_width: u64, word_width: u32) -> Vec<u64> {
    let word_count = (total_width + word_width as u64 - 1) / word_width as u64;
    (0..word_count)
        .map(|i| {
            let window = shift_and(raw, i * word_width as u64, word_width as u64);
            window.iter_u64_digits().next().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_and_capacity() {
        assert_eq!(mask(4), BigUint::from(0b1111u32));
        assert_eq!(capacity(4), BigUint::from(16u32));
        assert_eq!(mask(0), BigUint::zero());
    }

    #[test]
    fn shift_and_extracts_window() {
        // a = uint(5) at offset 0, b = uint(13) at offset 5.
        let a = 11u32;
        let b = 5461u32;
        let raw = BigUint::from((b << 5) | a);
        assert_eq!(shift_and(&raw, 0, 5), BigUint::from(a));
        assert_eq!(shift_and(&raw, 5, 13), BigUint::from(b));
    }

    #[test]
    fn set_window_preserves_other_bits() {
        let raw = BigUint::from(0b1010_1111u32);
        let updated = set_window(&raw, 0, 4, &BigUint::from(0b0000u32));
        assert_eq!(updated, BigUint::from(0b1010_0000u32));
        let updated = set_window(&raw, 4, 4, &BigUint::from(0b0101u32));
        assert_eq!(updated, BigUint::from(0b0101_1111u32));
    }

    #[test]
    fn words_round_trip() {
        let words = [0x1234_5678_u64, 0x9abc_def0_u64];
        let raw = from_words_le(&words, 32);
        let back = into_words_le(&raw, 64, 32);
        assert_eq!(back, words);
    }
}
