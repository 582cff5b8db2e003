//! The UTF transcoder: conversion among UTF-8, UTF-16, and UTF-32 code-unit
//! sequences with strict validation.
//!
//! Width dispatch is static through the sealed [`CodeUnit`] trait rather than
//! through trait objects, since transcoding is a hot, allocation-sensitive
//! path. Validation rejects overlong UTF-8 forms, encoded surrogates, unpaired
//! UTF-16 surrogate halves, and scalar values above U+10FFFF.

use std::fmt;

use super::{engine::ErrorPolicy, ConvError};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for char {}
}

/// A UTF code unit: `u8` for UTF-8, `u16` for UTF-16, `u32` for UTF-32, and
/// `char` for pre-validated scalar sequences.
///
/// This trait is sealed and not meant for implementation outside this crate.
pub trait CodeUnit: sealed::Sealed + Copy + Eq + fmt::Debug + 'static {
    /// Decodes one scalar value from the head of `units`, which must not be
    /// empty.
    ///
    /// Returns the number of units consumed and the decoded scalar, or `Err`
    /// if the head is invalid. On error the consumed count covers exactly the
    /// minimal invalid unit (a single code unit), so a Skip-policy caller can
    /// drop it and retry at the next unit.
    fn decode_step(units: &[Self]) -> (usize, Result<char, ()>);

    /// Appends the encoded form of `c` to `out`.
    fn push_char(c: char, out: &mut Vec<Self>);
}

impl CodeUnit for u8 {
    fn decode_step(units: &[Self]) -> (usize, Result<char, ()>) {
        let b0 = units[0];
        let (len, min) = match b0 {
            0x00..=0x7F => return (1, Ok(b0 as char)),
            0xC2..=0xDF => (2, 0x80),
            0xE0..=0xEF => (3, 0x800),
            0xF0..=0xF4 => (4, 0x10000),
            // stray continuation bytes, overlong leads (C0/C1), and leads
            // beyond U+10FFFF (F5..FF)
            _ => return (1, Err(())),
        };
        if units.len() < len {
            return (1, Err(()));
        }
        let mut cp = u32::from(b0) & (0x7F >> len);
        for &b in &units[1..len] {
            if b & 0xC0 != 0x80 {
                return (1, Err(()));
            }
            cp = (cp << 6) | u32::from(b & 0x3F);
        }
        if cp < min {
            return (1, Err(())); // overlong form
        }
        match char::from_u32(cp) {
            Some(c) => (len, Ok(c)),
            None => (1, Err(())), // surrogate or above U+10FFFF
        }
    }

    fn push_char(c: char, out: &mut Vec<Self>) {
        out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
    }
}

impl CodeUnit for u16 {
    fn decode_step(units: &[Self]) -> (usize, Result<char, ()>) {
        let u0 = units[0];
        match u0 {
            0xD800..=0xDBFF => match units.get(1) {
                Some(&(u1 @ 0xDC00..=0xDFFF)) => {
                    let cp = 0x10000
                        + ((u32::from(u0) - 0xD800) << 10)
                        + (u32::from(u1) - 0xDC00);
                    match char::from_u32(cp) {
                        Some(c) => (2, Ok(c)),
                        None => (1, Err(())),
                    }
                }
                // high surrogate not immediately followed by a low surrogate
                _ => (1, Err(())),
            },
            // low surrogate without a preceding high surrogate
            0xDC00..=0xDFFF => (1, Err(())),
            _ => match char::from_u32(u0.into()) {
                Some(c) => (1, Ok(c)),
                None => (1, Err(())),
            },
        }
    }

    fn push_char(c: char, out: &mut Vec<Self>) {
        out.extend_from_slice(c.encode_utf16(&mut [0; 2]));
    }
}

impl CodeUnit for u32 {
    fn decode_step(units: &[Self]) -> (usize, Result<char, ()>) {
        match char::from_u32(units[0]) {
            Some(c) => (1, Ok(c)),
            None => (1, Err(())),
        }
    }

    fn push_char(c: char, out: &mut Vec<Self>) {
        out.push(u32::from(c));
    }
}

impl CodeUnit for char {
    fn decode_step(units: &[Self]) -> (usize, Result<char, ()>) {
        (1, Ok(units[0]))
    }

    fn push_char(c: char, out: &mut Vec<Self>) {
        out.push(c);
    }
}

/// Converts a code-unit sequence from one UTF representation to another.
///
/// Under [`ErrorPolicy::Stop`], the first invalid unit aborts the conversion
/// with its offset; under [`ErrorPolicy::Skip`], each invalid unit is dropped
/// and conversion continues, producing the maximal valid output.
///
/// # Examples
///
/// ```rust
/// use charset_conv::{utf_to_utf, ErrorPolicy};
///
/// let utf16 = utf_to_utf::<u16, u8>("𠂊".as_bytes(), ErrorPolicy::Stop)?;
/// assert_eq!(utf16, [0xD840, 0xDC8A]);
///
/// let back = utf_to_utf::<u8, u16>(&utf16, ErrorPolicy::Stop)?;
/// assert_eq!(back, "𠂊".as_bytes());
/// # Ok::<(), charset_conv::ConvError>(())
/// ```
pub fn utf_to_utf<Out: CodeUnit, In: CodeUnit>(
    src: &[In],
    policy: ErrorPolicy,
) -> Result<Vec<Out>, ConvError> {
    let mut out = Vec::with_capacity(src.len());
    let mut pos = 0;
    while pos < src.len() {
        let (consumed, result) = In::decode_step(&src[pos..]);
        match result {
            Ok(c) => Out::push_char(c, &mut out),
            Err(()) => match policy {
                ErrorPolicy::Stop => return Err(ConvError::invalid_sequence(pos)),
                ErrorPolicy::Skip => {}
            },
        }
        pos += consumed;
    }
    Ok(out)
}

/// Encodes a validated string into a code-unit sequence; infallible.
pub(crate) fn units_from_str<T: CodeUnit>(s: &str) -> Vec<T> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        T::push_char(c, &mut out);
    }
    out
}

/// Decodes a code-unit sequence into a string, applying the error policy to
/// invalid units. The `Stop` offset is in input code units.
pub(crate) fn string_from_units<T: CodeUnit>(
    units: &[T],
    policy: ErrorPolicy,
) -> Result<String, ConvError> {
    let mut out = String::with_capacity(units.len());
    let mut pos = 0;
    while pos < units.len() {
        let (consumed, result) = T::decode_step(&units[pos..]);
        match result {
            Ok(c) => out.push(c),
            Err(()) => match policy {
                ErrorPolicy::Stop => return Err(ConvError::invalid_sequence(pos)),
                ErrorPolicy::Skip => {}
            },
        }
        pos += consumed;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{utf_to_utf, ConvError, ErrorPolicy};

    fn stop_offset<Out: super::CodeUnit, In: super::CodeUnit>(src: &[In]) -> usize {
        match utf_to_utf::<Out, In>(src, ErrorPolicy::Stop) {
            Err(ConvError::InvalidSequence { offset }) => offset,
            ret => panic!("assertion failed: {:?}", ret),
        }
    }

    #[test]
    fn rejects_overlong_utf8() {
        for bad in [
            &[0xC0, 0xAF][..],          // overlong '/'
            &[0xC1, 0xBF][..],          // overlong U+7F
            &[0xE0, 0x80, 0x80][..],    // overlong NUL
            &[0xE0, 0x9F, 0xBF][..],    // overlong U+7FF
            &[0xF0, 0x80, 0x80, 0x80][..],
            &[0xF0, 0x8F, 0xBF, 0xBF][..], // overlong U+FFFF
        ] {
            assert_eq!(stop_offset::<u32, u8>(bad), 0);
            assert_eq!(utf_to_utf::<u32, u8>(bad, ErrorPolicy::Skip).unwrap(), []);
        }
    }

    #[test]
    fn rejects_utf8_encoded_surrogates_and_high_leads() {
        assert_eq!(stop_offset::<u32, u8>(&[0xED, 0xA0, 0x80]), 0); // U+D800
        assert_eq!(stop_offset::<u32, u8>(&[0xED, 0xBF, 0xBF]), 0); // U+DFFF
        assert_eq!(stop_offset::<u32, u8>(&[0xF4, 0x90, 0x80, 0x80]), 0); // U+110000
        assert_eq!(stop_offset::<u32, u8>(&[0xF5, 0x80, 0x80, 0x80]), 0);
    }

    #[test]
    fn rejects_truncated_utf8() {
        assert_eq!(stop_offset::<u32, u8>(&[b'a', 0xC3]), 1);
        assert_eq!(stop_offset::<u32, u8>(&[0xE6, 0x97]), 0);
        // truncated sequence followed by ASCII resumes after one byte under Skip
        assert_eq!(
            utf_to_utf::<u32, u8>(&[0xC3, b'a'], ErrorPolicy::Skip).unwrap(),
            [u32::from(b'a')]
        );
    }

    #[test]
    fn rejects_unpaired_surrogates() {
        // unpaired high surrogate at end of input
        assert_eq!(stop_offset::<u8, u16>(&[0x67, 0xD801]), 1);
        // high surrogate not followed by a low surrogate
        assert_eq!(stop_offset::<u8, u16>(&[0xD801, 0x0067]), 0);
        // lone low surrogate
        assert_eq!(stop_offset::<u8, u16>(&[0xDC01, 0x0067]), 0);

        assert_eq!(
            utf_to_utf::<u8, u16>(&[0xD801, 0x67, 0xDC01, 0x72], ErrorPolicy::Skip).unwrap(),
            b"gr"
        );
    }

    #[test]
    fn rejects_out_of_range_utf32() {
        assert_eq!(stop_offset::<u8, u32>(&[0x67, 0x0100_0000]), 1);
        assert_eq!(stop_offset::<u8, u32>(&[0xD800]), 0);
        assert_eq!(
            utf_to_utf::<u8, u32>(&[0x67, 0x0100_0000, 0x72], ErrorPolicy::Skip).unwrap(),
            b"gr"
        );
    }

    #[test]
    fn pairs_supplementary_plane_code_points() {
        let s = "𠂊"; // U+2008A
        let utf16 = utf_to_utf::<u16, u8>(s.as_bytes(), ErrorPolicy::Stop).unwrap();
        assert_eq!(utf16, [0xD840, 0xDC8A]);
        let utf32 = utf_to_utf::<u32, u16>(&utf16, ErrorPolicy::Stop).unwrap();
        assert_eq!(utf32, [0x2008A]);
        let utf8 = utf_to_utf::<u8, u32>(&utf32, ErrorPolicy::Stop).unwrap();
        assert_eq!(utf8, s.as_bytes());
    }

    #[test]
    fn char_units_round_trip() {
        let chars = utf_to_utf::<char, u8>("grüßen".as_bytes(), ErrorPolicy::Stop).unwrap();
        assert_eq!(chars, "grüßen".chars().collect::<Vec<_>>());
        let utf8 = utf_to_utf::<u8, char>(&chars, ErrorPolicy::Stop).unwrap();
        assert_eq!(utf8, "grüßen".as_bytes());
    }
}
