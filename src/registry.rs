//! The codec registry: maps normalized encoding names to conversion codecs.
//!
//! The registry is a process-wide, read-only table built into the binary. Name
//! lookup normalizes the requested name and binary-searches the table, so all
//! aliases of a canonical encoding resolve to the same codec implementation. A
//! name present in the table but lacking a usable codec fails with
//! [`ConvError::UnknownEncoding`] rather than silently substituting another
//! encoding.

use encoding_rs::Encoding;

use super::{ConvError, Locale};

/// Normalizes an encoding name for registry comparison.
///
/// ASCII letters are lowercased and everything that is not an ASCII letter or
/// digit (separators such as `-` and `_`) is dropped. Normalization is
/// idempotent.
///
/// # Examples
///
/// ```rust
/// use charset_conv::normalize_encoding;
///
/// assert_eq!(normalize_encoding("ISO-8859-8"), "iso88598");
/// assert_eq!(normalize_encoding("UTF_8"), "utf8");
/// assert_eq!(normalize_encoding("utf8"), "utf8");
/// ```
pub fn normalize_encoding(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// An entry of the Windows codepage table: a normalized encoding name paired
/// with its numeric codepage identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsEncoding {
    pub name: &'static str,
    pub codepage: u16,
}

/// The static Windows codepage table, sorted by name for binary search.
///
/// Several names may share one codepage (aliases), but no two entries share
/// both the same name and the same codepage; the table self-check in the test
/// suite verifies this together with the sort order.
static WIN_CODEPAGES: &[WindowsEncoding] = &[
    WindowsEncoding { name: "big5", codepage: 950 },
    WindowsEncoding { name: "cp1250", codepage: 1250 },
    WindowsEncoding { name: "cp1251", codepage: 1251 },
    WindowsEncoding { name: "cp1252", codepage: 1252 },
    WindowsEncoding { name: "cp1253", codepage: 1253 },
    WindowsEncoding { name: "cp1254", codepage: 1254 },
    WindowsEncoding { name: "cp1255", codepage: 1255 },
    WindowsEncoding { name: "cp1256", codepage: 1256 },
    WindowsEncoding { name: "cp1257", codepage: 1257 },
    WindowsEncoding { name: "cp874", codepage: 874 },
    WindowsEncoding { name: "cp932", codepage: 932 },
    WindowsEncoding { name: "cp936", codepage: 936 },
    WindowsEncoding { name: "eucjp", codepage: 20932 },
    WindowsEncoding { name: "euckr", codepage: 51949 },
    WindowsEncoding { name: "gb18030", codepage: 54936 },
    WindowsEncoding { name: "gb2312", codepage: 936 },
    WindowsEncoding { name: "gbk", codepage: 936 },
    WindowsEncoding { name: "iso2022jp", codepage: 50220 },
    WindowsEncoding { name: "iso88591", codepage: 28591 },
    WindowsEncoding { name: "iso885913", codepage: 28603 },
    WindowsEncoding { name: "iso885915", codepage: 28605 },
    WindowsEncoding { name: "iso88592", codepage: 28592 },
    WindowsEncoding { name: "iso88593", codepage: 28593 },
    WindowsEncoding { name: "iso88594", codepage: 28594 },
    WindowsEncoding { name: "iso88595", codepage: 28595 },
    WindowsEncoding { name: "iso88596", codepage: 28596 },
    WindowsEncoding { name: "iso88597", codepage: 28597 },
    WindowsEncoding { name: "iso88598", codepage: 28598 },
    WindowsEncoding { name: "iso88599", codepage: 28599 },
    WindowsEncoding { name: "koi8r", codepage: 20866 },
    WindowsEncoding { name: "koi8u", codepage: 21866 },
    WindowsEncoding { name: "latin1", codepage: 28591 },
    WindowsEncoding { name: "ms936", codepage: 936 },
    WindowsEncoding { name: "shiftjis", codepage: 932 },
    WindowsEncoding { name: "sjis", codepage: 932 },
    WindowsEncoding { name: "usascii", codepage: 20127 },
    WindowsEncoding { name: "utf8", codepage: 65001 },
    WindowsEncoding { name: "windows1250", codepage: 1250 },
    WindowsEncoding { name: "windows1251", codepage: 1251 },
    WindowsEncoding { name: "windows1252", codepage: 1252 },
    WindowsEncoding { name: "windows1253", codepage: 1253 },
    WindowsEncoding { name: "windows1254", codepage: 1254 },
    WindowsEncoding { name: "windows1255", codepage: 1255 },
    WindowsEncoding { name: "windows1256", codepage: 1256 },
    WindowsEncoding { name: "windows1257", codepage: 1257 },
    WindowsEncoding { name: "windows874", codepage: 874 },
    WindowsEncoding { name: "windows932", codepage: 932 },
    WindowsEncoding { name: "windows936", codepage: 936 },
];

/// Returns the Windows codepage table consumed by the registry.
pub fn windows_codepages() -> &'static [WindowsEncoding] {
    WIN_CODEPAGES
}

/// The codec implementation backing a resolved encoding name.
///
/// Latin-1 and UTF-8 are implemented in this crate (Latin-1 is an exact
/// ISO-8859-1 byte-to-scalar identity, which `encoding_rs` does not provide);
/// everything else delegates to an `encoding_rs` codec.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CodecImpl {
    Utf8,
    Latin1,
    External(&'static Encoding),
}

/// A resolved codec handle: a codepage table entry paired with the codec
/// implementation that serves it.
#[derive(Debug, Clone, Copy)]
pub struct CodecHandle {
    entry: &'static WindowsEncoding,
    imp: CodecImpl,
}

impl CodecHandle {
    /// Returns the canonical (normalized) encoding name.
    pub fn name(&self) -> &'static str {
        self.entry.name
    }

    /// Returns the numeric Windows codepage identifier.
    pub fn codepage(&self) -> u16 {
        self.entry.codepage
    }

    pub(crate) fn imp(&self) -> CodecImpl {
        self.imp
    }
}

/// Maps a codepage to its codec implementation, or `None` where no codec is
/// available (the name then fails lookup rather than being substituted).
fn codec_for_codepage(codepage: u16) -> Option<CodecImpl> {
    use encoding_rs::*;
    Some(match codepage {
        65001 => CodecImpl::Utf8,
        28591 => CodecImpl::Latin1,
        874 => CodecImpl::External(WINDOWS_874),
        932 => CodecImpl::External(SHIFT_JIS),
        936 => CodecImpl::External(GBK),
        950 => CodecImpl::External(BIG5),
        1250 => CodecImpl::External(WINDOWS_1250),
        1251 => CodecImpl::External(WINDOWS_1251),
        1252 => CodecImpl::External(WINDOWS_1252),
        1253 => CodecImpl::External(WINDOWS_1253),
        1254 => CodecImpl::External(WINDOWS_1254),
        1255 => CodecImpl::External(WINDOWS_1255),
        1256 => CodecImpl::External(WINDOWS_1256),
        1257 => CodecImpl::External(WINDOWS_1257),
        20866 => CodecImpl::External(KOI8_R),
        20932 => CodecImpl::External(EUC_JP),
        21866 => CodecImpl::External(KOI8_U),
        28592 => CodecImpl::External(ISO_8859_2),
        28593 => CodecImpl::External(ISO_8859_3),
        28594 => CodecImpl::External(ISO_8859_4),
        28595 => CodecImpl::External(ISO_8859_5),
        28596 => CodecImpl::External(ISO_8859_6),
        28597 => CodecImpl::External(ISO_8859_7),
        28598 => CodecImpl::External(ISO_8859_8),
        // ISO-8859-9 is served by its windows-1254 superset, as in WHATWG.
        28599 => CodecImpl::External(WINDOWS_1254),
        28603 => CodecImpl::External(ISO_8859_13),
        28605 => CodecImpl::External(ISO_8859_15),
        50220 => CodecImpl::External(ISO_2022_JP),
        51949 => CodecImpl::External(EUC_KR),
        54936 => CodecImpl::External(GB18030),
        _ => return None,
    })
}

/// Resolves an encoding name to a codec handle.
///
/// The name is normalized before the table lookup, so `"ISO8859-8"`,
/// `"iso_8859_8"`, and `"ISO-8859-8"` all resolve to the same handle.
pub fn lookup(name: &str) -> Result<CodecHandle, ConvError> {
    let normalized = normalize_encoding(name);
    let index = WIN_CODEPAGES
        .binary_search_by(|e| e.name.cmp(normalized.as_str()))
        .map_err(|_| ConvError::unknown_encoding(name))?;
    let entry = &WIN_CODEPAGES[index];
    match codec_for_codepage(entry.codepage) {
        Some(imp) => Ok(CodecHandle { entry, imp }),
        None => Err(ConvError::unknown_encoding(name)),
    }
}

/// A charset argument: either a bare encoding name or a [`Locale`] that
/// already designates an encoding.
///
/// Conversion entry points take `impl Into<Charset<'_>>`, so `&str` and
/// `&Locale` are accepted directly. Resolution to a codec happens once, here
/// at the registry boundary.
#[derive(Debug, Clone, Copy)]
pub enum Charset<'a> {
    Name(&'a str),
    Locale(&'a Locale),
}

impl Charset<'_> {
    pub(crate) fn resolve(&self) -> Result<CodecHandle, ConvError> {
        match self {
            Self::Name(name) => lookup(name),
            Self::Locale(locale) => Ok(locale.handle()),
        }
    }
}

impl<'a> From<&'a str> for Charset<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for Charset<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Locale> for Charset<'a> {
    fn from(locale: &'a Locale) -> Self {
        Self::Locale(locale)
    }
}
