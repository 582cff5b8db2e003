use super::{registry, CodecHandle, ConvError};

/// A locale handle that designates an encoding.
///
/// Parses the encoding component of a POSIX-style locale identifier
/// (`language_REGION.ENCODING[@modifier]`) and resolves the codec once at
/// construction, so repeated conversions bound to the locale skip the registry
/// lookup. An identifier without an encoding component designates UTF-8.
///
/// # Examples
///
/// ```rust
/// use charset_conv::{to_utf8, ErrorPolicy, Locale};
///
/// let locale = Locale::new("he_IL.ISO8859-8")?;
/// assert_eq!(locale.encoding(), "iso88598");
/// assert_eq!(
///     to_utf8(b"\xf9\xec\xe5\xed", &locale, ErrorPolicy::Stop)?,
///     "שלום"
/// );
/// # Ok::<(), charset_conv::ConvError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Locale {
    id: String,
    handle: CodecHandle,
}

impl Locale {
    /// Creates a locale handle from a locale identifier, resolving its
    /// encoding against the codec registry.
    pub fn new(id: &str) -> Result<Self, ConvError> {
        let encoding = match id.split_once('.') {
            Some((_, rest)) => rest.split('@').next().unwrap_or(rest),
            None => "UTF-8",
        };
        let handle = registry::lookup(encoding)?;
        Ok(Self {
            id: id.to_owned(),
            handle,
        })
    }

    /// Returns the locale identifier this handle was constructed from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the canonical name of the encoding this locale designates.
    pub fn encoding(&self) -> &'static str {
        self.handle.name()
    }

    pub(crate) fn handle(&self) -> CodecHandle {
        self.handle
    }
}
