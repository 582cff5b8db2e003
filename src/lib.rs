//! Charset to UTF conversion with stop/skip error policies
//!
//! This crate converts byte sequences between legacy byte encodings (Latin-1,
//! ISO-8859-x, Shift-JIS/cp932, ISO-2022-JP, Windows code pages, ...) and the
//! Unicode transformation formats, with a configurable error policy: [`Stop`]
//! aborts at the first invalid unit, reporting its offset, while [`Skip`]
//! drops invalid units and produces the maximal valid output.
//!
//! ```rust
//! use charset_conv::{from_utf8, to_utf8, utf_to_utf, ErrorPolicy};
//!
//! // legacy bytes to UTF-8 and back
//! assert_eq!(to_utf8(b"hello \xf9\xec\xe5\xed", "ISO8859-8", ErrorPolicy::Stop)?, "hello שלום");
//! assert_eq!(from_utf8("grüßen", "Latin1", ErrorPolicy::Stop)?, b"gr\xfc\xdf\x65\x6e");
//!
//! // Skip drops what the target cannot represent
//! assert_eq!(from_utf8("hello שלום", "Latin1", ErrorPolicy::Skip)?, b"hello ");
//!
//! // direct conversion between UTF widths
//! let utf16 = utf_to_utf::<u16, u8>("日本".as_bytes(), ErrorPolicy::Stop)?;
//! assert_eq!(utf16, [0x65E5, 0x672C]);
//! # Ok::<(), charset_conv::ConvError>(())
//! ```
//!
//! The stream adapters [`ConvReader`] and [`ConvWriter`] perform the same
//! conversion transparently over `std::io` byte transports, failing at the
//! exact position of the first invalid unit and latching a failed state from
//! then on.
//!
//! Encoding names are resolved through a static, read-only [registry]; the
//! conversion functions are pure and safe for concurrent independent use.
//! Each stream adapter, by contrast, owns exclusive cursor state and must be
//! driven by a single caller.
//!
//! [`Stop`]: ErrorPolicy::Stop
//! [`Skip`]: ErrorPolicy::Skip

mod engine;
mod error;
mod locale;
mod reader;
mod writer;

mod util;

pub mod registry;
pub mod utf;

pub use engine::ErrorPolicy;
pub use error::ConvError;
pub use locale::Locale;
pub use reader::ConvReader;
pub use registry::{normalize_encoding, Charset, CodecHandle};
pub use utf::{utf_to_utf, CodeUnit};
pub use writer::ConvWriter;

/// Converts bytes in the given encoding to a UTF code-unit sequence.
///
/// `charset` accepts an encoding name (`&str`) or a [`Locale`]. The output
/// unit width is chosen by the type parameter: `u8` for UTF-8, `u16` for
/// UTF-16, `u32` for UTF-32, or `char`.
///
/// # Examples
///
/// ```rust
/// use charset_conv::{to_utf, ErrorPolicy};
///
/// let utf16 = to_utf::<u16>(b"\x93\xfa\x96\x7b", "Shift_JIS", ErrorPolicy::Stop)?;
/// assert_eq!(utf16, [0x65E5, 0x672C]);
/// # Ok::<(), charset_conv::ConvError>(())
/// ```
pub fn to_utf<'a, T: CodeUnit>(
    bytes: &[u8],
    charset: impl Into<Charset<'a>>,
    policy: ErrorPolicy,
) -> Result<Vec<T>, ConvError> {
    let handle = charset.into().resolve()?;
    let pivot = engine::decode_bytes(handle, bytes, policy)?;
    Ok(utf::units_from_str(&pivot))
}

/// Converts a UTF code-unit sequence to bytes in the given encoding.
///
/// The policy governs both invalid input units and characters the target
/// encoding cannot represent.
pub fn from_utf<'a, T: CodeUnit>(
    units: &[T],
    charset: impl Into<Charset<'a>>,
    policy: ErrorPolicy,
) -> Result<Vec<u8>, ConvError> {
    let handle = charset.into().resolve()?;
    let pivot = utf::string_from_units(units, policy)?;
    engine::encode_str(handle, &pivot, policy)
}

/// Converts bytes in the given encoding to a `String`.
///
/// Equivalent to [`to_utf::<u8>`](to_utf) but avoids the unit conversion for
/// the common UTF-8 target.
pub fn to_utf8<'a>(
    bytes: &[u8],
    charset: impl Into<Charset<'a>>,
    policy: ErrorPolicy,
) -> Result<String, ConvError> {
    let handle = charset.into().resolve()?;
    engine::decode_bytes(handle, bytes, policy)
}

/// Converts a string to bytes in the given encoding.
pub fn from_utf8<'a>(
    s: &str,
    charset: impl Into<Charset<'a>>,
    policy: ErrorPolicy,
) -> Result<Vec<u8>, ConvError> {
    let handle = charset.into().resolve()?;
    engine::encode_str(handle, s, policy)
}

#[cfg(test)]
mod tests;
